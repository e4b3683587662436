use std::path::Path;

use anyhow::{Context, Result};
use sqlx::{Sqlite, SqlitePool};

use super::ingredient_helpers::search_key;
use crate::models::{NewIngredient, NewTag};

/// Loads tags from a JSON file into an empty `tags` table. Returns the number
/// of rows inserted; a populated table is left alone.
pub async fn load_tags_fixture(pool: &SqlitePool, path: &Path) -> Result<usize> {
    let tags: Vec<NewTag> = read_fixture(path).await?;
    let mut tx = pool.begin().await?;
    let existing = sqlx::query_scalar::<Sqlite, i64>("SELECT COUNT(*) FROM tags")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        tracing::debug!(existing, "tags table already populated, skipping fixture");
        return Ok(0);
    }
    for tag in &tags {
        sqlx::query("INSERT INTO tags (name, color, slug) VALUES (?1, ?2, ?3)")
            .bind(&tag.name)
            .bind(&tag.color)
            .bind(&tag.slug)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert tag {:?}", tag.slug))?;
    }
    tx.commit().await?;
    Ok(tags.len())
}

/// Loads ingredients from a JSON file into an empty `ingredients` table.
/// Repeated (name, unit) pairs in the file are inserted once.
pub async fn load_ingredients_fixture(pool: &SqlitePool, path: &Path) -> Result<usize> {
    let ingredients: Vec<NewIngredient> = read_fixture(path).await?;
    let mut tx = pool.begin().await?;
    let existing = sqlx::query_scalar::<Sqlite, i64>("SELECT COUNT(*) FROM ingredients")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        tracing::debug!(existing, "ingredients table already populated, skipping fixture");
        return Ok(0);
    }
    let mut inserted = 0;
    for ingredient in &ingredients {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO ingredients (name, measurement_unit, search_name)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&ingredient.name)
        .bind(&ingredient.measurement_unit)
        .bind(search_key(&ingredient.name))
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected() as usize;
    }
    tx.commit().await?;
    Ok(inserted)
}

async fn read_fixture<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Malformed fixture {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_helpers::{get_tags_in_db, search_ingredients_in_db, test_utils::*};

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let path =
            std::env::temp_dir().join(format!("foodgram-fixture-{}.json", rand::random::<u64>()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn ingredients_fixture_loads_once_and_skips_duplicates() {
        let pool = setup_test_db().await;
        let path = write_temp(
            r#"[
                {"name": "flour", "measurement_unit": "g"},
                {"name": "flour", "measurement_unit": "g"},
                {"name": "milk", "measurement_unit": "ml"}
            ]"#,
        );

        assert_eq!(load_ingredients_fixture(&pool, &path).await.unwrap(), 2);
        assert_eq!(load_ingredients_fixture(&pool, &path).await.unwrap(), 0);
        assert_eq!(search_ingredients_in_db(&pool, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn tags_fixture_loads_into_empty_table() {
        let pool = setup_test_db().await;
        let path = write_temp(r##"[{"name": "Lunch", "color": "#49B64E", "slug": "lunch"}]"##);

        assert_eq!(load_tags_fixture(&pool, &path).await.unwrap(), 1);
        let tags = get_tags_in_db(&pool).await.unwrap();
        assert_eq!(tags[0].slug, "lunch");
    }

    #[tokio::test]
    async fn malformed_fixture_is_an_error() {
        let pool = setup_test_db().await;
        let path = write_temp("{not json");
        assert!(load_tags_fixture(&pool, &path).await.is_err());
    }
}
