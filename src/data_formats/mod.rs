mod request;
mod response;
mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

const DEFAULT_RECIPES_LIMIT: u32 = 3;
const MAX_PAGE_SIZE: u32 = 100;

/// A resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct PaginationParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PaginationParams {
    pub fn resolve(&self, default_limit: u32) -> Page {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
        Page {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct SubscriptionQueryParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub recipes_limit: Option<u32>,
}

impl SubscriptionQueryParams {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn recipes_limit(&self) -> u32 {
        self.recipes_limit.unwrap_or(DEFAULT_RECIPES_LIMIT)
    }
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct IngredientQueryParams {
    #[serde(default)]
    pub name: Option<String>,
}

/// Recipe list filters. `tags` may repeat, so these are parsed from raw
/// query pairs rather than through a flat struct.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecipeQueryParams {
    pub pagination: (Option<u32>, Option<u32>),
    pub author: Option<i64>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeQueryParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, RequestError> {
        let mut params = RecipeQueryParams::default();
        for (key, value) in pairs {
            match key.as_str() {
                "page" => params.pagination.0 = Some(parse_number(&key, &value)?),
                "limit" => params.pagination.1 = Some(parse_number(&key, &value)?),
                "author" => params.author = Some(parse_number(&key, &value)?),
                "tags" => params.tags.push(value),
                "is_favorited" => params.is_favorited = parse_flag(&value),
                "is_in_shopping_cart" => params.is_in_shopping_cart = parse_flag(&value),
                _ => {}
            }
        }
        Ok(params)
    }

    pub fn page(&self, default_limit: u32) -> Page {
        PaginationParams {
            page: self.pagination.0,
            limit: self.pagination.1,
        }
        .resolve(default_limit)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, RequestError> {
    value
        .parse()
        .map_err(|_| RequestError::validation(format!("Invalid value for {key}: {value}")))
}

fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn repeated_tags_are_collected() {
        let params = RecipeQueryParams::from_pairs(pairs(&[
            ("tags", "breakfast"),
            ("tags", "lunch"),
            ("is_favorited", "1"),
            ("author", "3"),
        ]))
        .unwrap();
        assert_eq!(params.tags, vec!["breakfast", "lunch"]);
        assert!(params.is_favorited);
        assert!(!params.is_in_shopping_cart);
        assert_eq!(params.author, Some(3));
    }

    #[test]
    fn non_numeric_author_is_rejected() {
        let result = RecipeQueryParams::from_pairs(pairs(&[("author", "me")]));
        assert!(matches!(result, Err(RequestError::Validation(_))));
    }

    #[test]
    fn page_zero_is_treated_as_first_page() {
        let page = PaginationParams {
            page: Some(0),
            limit: None,
        }
        .resolve(6);
        assert_eq!(
            page,
            Page {
                page: 1,
                limit: 6,
                offset: 0
            }
        );
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let page = PaginationParams {
            page: Some(3),
            limit: Some(10),
        }
        .resolve(6);
        assert_eq!(page.offset, 20);
    }
}
