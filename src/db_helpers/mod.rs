use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::User};

mod fixture_helpers;
mod ingredient_helpers;
mod profile_helpers;
mod recipe_helpers;
mod relation_helpers;
mod shopping_list_helpers;
mod tag_helpers;
mod user_helpers;

pub use fixture_helpers::*;
pub use ingredient_helpers::*;
pub use profile_helpers::*;
pub use recipe_helpers::*;
pub use relation_helpers::*;
pub use shopping_list_helpers::*;
pub use tag_helpers::*;
pub use user_helpers::*;

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, password, role";

// ----------------- Helper Functions -----------------

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

/// Resolves the caller of an authenticated request. A valid token whose user
/// has since been deleted is treated as unauthenticated.
pub async fn get_authenticated_user(pool: &SqlitePool, id: i64) -> Result<User, RequestError> {
    get_user_by_id(pool, id)
        .await?
        .ok_or(RequestError::NotAuthorized("User for this token no longer exists"))
}
