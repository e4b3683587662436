use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::RequestError,
    models::{Ingredient, NewIngredient},
};

/// Ingredients whose name starts with `prefix` (case-insensitive, including
/// non-ASCII letters), or all of them when no prefix is given.
pub async fn search_ingredients_in_db(
    pool: &SqlitePool,
    prefix: Option<&str>,
) -> Result<Vec<Ingredient>, RequestError> {
    let pattern = prefix
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(|prefix| format!("{}%", escape_like(&search_key(prefix))));
    let result = sqlx::query_as::<Sqlite, Ingredient>(
        r#"
        SELECT id, name, measurement_unit
        FROM   ingredients
        WHERE  ?1 IS NULL
            OR search_name LIKE ?1 ESCAPE '\'
        ORDER  BY name, measurement_unit
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn get_ingredient_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Ingredient, RequestError> {
    sqlx::query_as::<Sqlite, Ingredient>(
        "SELECT id, name, measurement_unit FROM ingredients WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(RequestError::NotFound("Ingredient not found"))
}

pub async fn insert_ingredient(
    pool: &SqlitePool,
    ingredient: &NewIngredient,
) -> Result<Ingredient, RequestError> {
    sqlx::query_as::<Sqlite, Ingredient>(
        r#"
        INSERT INTO ingredients (name, measurement_unit, search_name)
        VALUES (?1, ?2, ?3)
        RETURNING id, name, measurement_unit
        "#,
    )
    .bind(&ingredient.name)
    .bind(&ingredient.measurement_unit)
    .bind(search_key(&ingredient.name))
    .fetch_one(pool)
    .await
    .map_err(|e| RequestError::from(e).on_unique_violation("Ingredient already exists"))
}

/// SQLite only folds ASCII case, so names are stored and matched lowercased.
pub(crate) fn search_key(name: &str) -> String {
    name.to_lowercase()
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
