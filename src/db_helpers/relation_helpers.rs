use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::RequestError,
    models::{RecipeRelation, RecipeShort},
};

/// Adds the recipe to the user's favorites or shopping cart.
pub async fn add_recipe_relation_in_db(
    pool: &SqlitePool,
    user_id: i64,
    recipe_id: i64,
    relation: RecipeRelation,
) -> Result<RecipeShort, RequestError> {
    let mut tx = pool.begin().await?;
    let recipe = sqlx::query_as::<Sqlite, RecipeShort>(
        "SELECT id, name, image, cooking_time FROM recipes WHERE id = ?1",
    )
    .bind(recipe_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(RequestError::NotFound("Recipe not found"))?;

    let exists_query = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = ?1 AND recipe_id = ?2)",
        relation.table()
    );
    let exists = sqlx::query_scalar::<Sqlite, bool>(&exists_query)
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(&mut *tx)
        .await?;
    if exists {
        return Err(RequestError::validation(relation.already_exists_message()));
    }

    let insert_query = format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES (?1, ?2)",
        relation.table()
    );
    sqlx::query(&insert_query)
        .bind(user_id)
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RequestError::from(e).on_unique_violation(relation.already_exists_message()))?;
    tx.commit().await?;
    Ok(recipe)
}

pub async fn remove_recipe_relation_in_db(
    pool: &SqlitePool,
    user_id: i64,
    recipe_id: i64,
    relation: RecipeRelation,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let recipe_exists =
        sqlx::query_scalar::<Sqlite, bool>("SELECT EXISTS (SELECT 1 FROM recipes WHERE id = ?1)")
            .bind(recipe_id)
            .fetch_one(&mut *tx)
            .await?;
    if !recipe_exists {
        return Err(RequestError::NotFound("Recipe not found"));
    }

    let delete_query = format!(
        "DELETE FROM {} WHERE user_id = ?1 AND recipe_id = ?2",
        relation.table()
    );
    let result = sqlx::query(&delete_query)
        .bind(user_id)
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::validation(relation.missing_message()));
    }
    tx.commit().await?;
    Ok(())
}
