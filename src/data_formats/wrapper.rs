use serde::{Deserialize, Serialize};

use super::Page;

/// Page-number pagination envelope.
#[derive(Debug, Deserialize, Serialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(results: Vec<T>, count: i64, page: Page, path: &str) -> Self {
        let next = (i64::from(page.page) * i64::from(page.limit) < count)
            .then(|| page_link(path, page.page + 1, page.limit));
        let previous = (page.page > 1).then(|| page_link(path, page.page - 1, page.limit));
        Paginated {
            count,
            next,
            previous,
            results,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

fn page_link(path: &str, page: u32, limit: u32) -> String {
    format!("{path}?page={page}&limit={limit}")
}
