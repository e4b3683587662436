use axum::{
    http::{StatusCode, Uri},
    Json,
};

use crate::errors::{RequestError, RequestErrorJsonWrapper};

mod catalog_handlers;
mod recipe_handlers;
mod user_handlers;

pub use catalog_handlers::*;
pub use recipe_handlers::*;
pub use user_handlers::*;

pub type ApiResult<T> = Result<T, RequestError>;
pub type Created<T> = (StatusCode, Json<T>);

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<RequestErrorJsonWrapper>) {
    (
        StatusCode::NOT_FOUND,
        Json(RequestErrorJsonWrapper::new(&format!(
            "URL {} provided was not found",
            uri
        ))),
    )
}

fn created<T>(body: T) -> Created<T> {
    (StatusCode::CREATED, Json(body))
}
