use sqlx::{Sqlite, SqlitePool};

use crate::{data_formats::RegisterRequest, errors::RequestError, models::User};

/// Inserts a new account. `user.password` must already be hashed.
pub async fn insert_user(pool: &SqlitePool, user: &RegisterRequest) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let user = sqlx::query_as::<Sqlite, User>(
        r#"
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id, email, username, first_name, last_name, password, role
        "#,
    )
    .bind(user.email.trim())
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.password)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        RequestError::from(e).on_unique_violation("A user with that username or email already exists")
    })?;
    tx.commit().await?;
    Ok(user)
}

pub async fn update_password_in_db(
    pool: &SqlitePool,
    id: i64,
    password_hash: &str,
) -> Result<(), RequestError> {
    let result = sqlx::query("UPDATE users SET password = ?1 WHERE id = ?2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("User not found"));
    }
    Ok(())
}
