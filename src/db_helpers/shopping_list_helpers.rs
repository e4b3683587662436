use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::ShoppingListItem};

/// Sums ingredient amounts over every recipe in the user's cart, one row per
/// (name, unit), alphabetical.
pub async fn get_shopping_list_in_db(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<ShoppingListItem>, RequestError> {
    let result = sqlx::query_as::<Sqlite, ShoppingListItem>(
        r#"
        SELECT ingredients.name                 AS "name",
               ingredients.measurement_unit     AS "measurement_unit",
               SUM(recipe_ingredients.amount)   AS "amount"
        FROM   recipe_ingredients
               JOIN ingredients
                 ON ingredients.id = recipe_ingredients.ingredient_id
               JOIN shopping_cart
                 ON shopping_cart.recipe_id = recipe_ingredients.recipe_id
        WHERE  shopping_cart.user_id = ?1
        GROUP  BY ingredients.name, ingredients.measurement_unit
        ORDER  BY ingredients.name, ingredients.measurement_unit
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(result)
}
