use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::RequestError,
    models::{NewTag, Tag},
};

pub async fn get_tags_in_db(pool: &SqlitePool) -> Result<Vec<Tag>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Tag>("SELECT id, name, color, slug FROM tags ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(result)
}

pub async fn get_tag_by_id_in_db(pool: &SqlitePool, id: i64) -> Result<Tag, RequestError> {
    sqlx::query_as::<Sqlite, Tag>("SELECT id, name, color, slug FROM tags WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RequestError::NotFound("Tag not found"))
}

pub async fn insert_tag(pool: &SqlitePool, tag: &NewTag) -> Result<Tag, RequestError> {
    sqlx::query_as::<Sqlite, Tag>(
        r#"
        INSERT INTO tags (name, color, slug)
        VALUES (?1, ?2, ?3)
        RETURNING id, name, color, slug
        "#,
    )
    .bind(&tag.name)
    .bind(&tag.color)
    .bind(&tag.slug)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        RequestError::from(e).on_unique_violation("Tag name, color and slug must be unique")
    })
}
