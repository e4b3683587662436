use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::data_formats::{
    CreateRecipeRequest, IngredientAmount, Page, RecipeQueryParams, UpdateRecipeRequest,
};
use crate::errors::RequestError;
use crate::models::{Recipe, RecipeIngredient, RecipeWithRelations, Tag, User};

// ?1 is always the viewer id (NULL for anonymous viewers).
const RECIPE_QUERY: &str = r#"
    SELECT recipes.id                                       AS "id",
           recipes.name                                     AS "name",
           recipes.image                                    AS "image",
           recipes.text                                     AS "text",
           recipes.cooking_time                             AS "cooking_time",
           users.id                                         AS "author_id",
           users.email                                      AS "author_email",
           users.username                                   AS "author_username",
           users.first_name                                 AS "author_first_name",
           users.last_name                                  AS "author_last_name",
           EXISTS (SELECT 1
                   FROM   follows
                   WHERE  follows.author_id = recipes.author_id
                      AND follows.follower_id = ?1)         AS "author_is_subscribed",
           EXISTS (SELECT 1
                   FROM   favorites
                   WHERE  favorites.recipe_id = recipes.id
                      AND favorites.user_id = ?1)           AS "is_favorited",
           EXISTS (SELECT 1
                   FROM   shopping_cart
                   WHERE  shopping_cart.recipe_id = recipes.id
                      AND shopping_cart.user_id = ?1)       AS "is_in_shopping_cart"
    FROM   recipes
           JOIN users
             ON recipes.author_id = users.id
"#;

// ?2 author id, ?3 JSON array of tag slugs, ?4 favorites-only, ?5 cart-only.
const RECIPE_FILTER: &str = r#"
    WHERE  ( ?2 IS NULL
              OR recipes.author_id = ?2 )
       AND ( ?3 IS NULL
              OR EXISTS (SELECT 1
                         FROM   recipe_tags
                                JOIN tags
                                  ON tags.id = recipe_tags.tag_id
                         WHERE  recipe_tags.recipe_id = recipes.id
                            AND tags.slug IN (SELECT value FROM json_each(?3))) )
       AND ( ?4 = 0
              OR EXISTS (SELECT 1
                         FROM   favorites
                         WHERE  favorites.recipe_id = recipes.id
                            AND favorites.user_id = ?1) )
       AND ( ?5 = 0
              OR EXISTS (SELECT 1
                         FROM   shopping_cart
                         WHERE  shopping_cart.recipe_id = recipes.id
                            AND shopping_cart.user_id = ?1) )
"#;

const RECIPE_ORDER: &str = "ORDER BY recipes.pub_date DESC, recipes.id DESC";

pub async fn get_recipe_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    recipe_id: i64,
) -> Result<RecipeWithRelations, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("{RECIPE_QUERY} WHERE recipes.id = ?2");
    let recipe = sqlx::query_as::<Sqlite, Recipe>(&query)
        .bind(viewer)
        .bind(recipe_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RequestError::NotFound("Recipe not found"))?;
    let result = load_relations(&mut tx, recipe).await?;
    tx.commit().await?;
    Ok(result)
}

/// Lists recipes newest first. The favorites and cart filters only apply to
/// an authenticated viewer.
pub async fn list_recipes_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    params: &RecipeQueryParams,
    page: Page,
) -> Result<(Vec<RecipeWithRelations>, i64), RequestError> {
    let tags = if params.tags.is_empty() {
        None
    } else {
        Some(
            serde_json::to_string(&params.tags)
                .map_err(|e| RequestError::ServerError(e.to_string()))?,
        )
    };
    let favorited_only = viewer.is_some() && params.is_favorited;
    let in_cart_only = viewer.is_some() && params.is_in_shopping_cart;

    let mut tx = pool.begin().await?;
    let query = format!("{RECIPE_QUERY} {RECIPE_FILTER} {RECIPE_ORDER} LIMIT ?6 OFFSET ?7");
    let recipes = sqlx::query_as::<Sqlite, Recipe>(&query)
        .bind(viewer)
        .bind(params.author)
        .bind(tags.as_deref())
        .bind(favorited_only)
        .bind(in_cart_only)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&mut *tx)
        .await?;

    let count_query = format!("SELECT COUNT(*) FROM recipes {RECIPE_FILTER}");
    let count = sqlx::query_scalar::<Sqlite, i64>(&count_query)
        .bind(viewer)
        .bind(params.author)
        .bind(tags.as_deref())
        .bind(favorited_only)
        .bind(in_cart_only)
        .fetch_one(&mut *tx)
        .await?;

    let mut result = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        result.push(load_relations(&mut tx, recipe).await?);
    }
    tx.commit().await?;
    Ok((result, count))
}

async fn load_relations(
    tx: &mut Transaction<'_, Sqlite>,
    recipe: Recipe,
) -> Result<RecipeWithRelations, RequestError> {
    let tags = sqlx::query_as::<Sqlite, Tag>(
        r#"
        SELECT tags.id, tags.name, tags.color, tags.slug
        FROM   tags
               JOIN recipe_tags
                 ON recipe_tags.tag_id = tags.id
        WHERE  recipe_tags.recipe_id = ?1
        ORDER  BY tags.id
        "#,
    )
    .bind(recipe.id)
    .fetch_all(&mut **tx)
    .await?;
    let ingredients = sqlx::query_as::<Sqlite, RecipeIngredient>(
        r#"
        SELECT ingredients.id, ingredients.name, ingredients.measurement_unit,
               recipe_ingredients.amount
        FROM   recipe_ingredients
               JOIN ingredients
                 ON ingredients.id = recipe_ingredients.ingredient_id
        WHERE  recipe_ingredients.recipe_id = ?1
        ORDER  BY recipe_ingredients.id
        "#,
    )
    .bind(recipe.id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(RecipeWithRelations {
        recipe,
        tags,
        ingredients,
    })
}

/// Creates the recipe with its tags and ingredient amounts in one
/// transaction and returns the new id.
pub async fn create_recipe_in_db(
    pool: &SqlitePool,
    author_id: i64,
    CreateRecipeRequest {
        name,
        image,
        text,
        cooking_time,
        tags,
        ingredients,
    }: CreateRecipeRequest,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;
    ensure_tags_exist(&mut tx, &tags).await?;
    ensure_ingredients_exist(&mut tx, &ingredients).await?;

    let recipe_id = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id
        "#,
    )
    .bind(author_id)
    .bind(name.trim())
    .bind(image)
    .bind(text)
    .bind(cooking_time)
    .fetch_one(&mut *tx)
    .await?;

    insert_recipe_tags(&mut tx, recipe_id, &tags).await?;
    insert_recipe_ingredients(&mut tx, recipe_id, &ingredients).await?;
    tx.commit().await?;
    tracing::debug!(recipe_id, author_id, "recipe created");
    Ok(recipe_id)
}

/// Applies a partial update. Supplied tag and ingredient lists replace the
/// stored ones; omitted lists are left as they are.
pub async fn update_recipe_in_db(
    pool: &SqlitePool,
    editor: &User,
    recipe_id: i64,
    UpdateRecipeRequest {
        name,
        image,
        text,
        cooking_time,
        tags,
        ingredients,
    }: UpdateRecipeRequest,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    ensure_can_modify(&mut tx, editor, recipe_id).await?;

    sqlx::query(
        r#"
        UPDATE recipes
        SET    name = COALESCE(?1, name),
               image = COALESCE(?2, image),
               text = COALESCE(?3, text),
               cooking_time = COALESCE(?4, cooking_time)
        WHERE  id = ?5
        "#,
    )
    .bind(name.as_deref().map(str::trim))
    .bind(image)
    .bind(text)
    .bind(cooking_time)
    .bind(recipe_id)
    .execute(&mut *tx)
    .await?;

    if let Some(tags) = tags {
        ensure_tags_exist(&mut tx, &tags).await?;
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        insert_recipe_tags(&mut tx, recipe_id, &tags).await?;
    }
    if let Some(ingredients) = ingredients {
        ensure_ingredients_exist(&mut tx, &ingredients).await?;
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        insert_recipe_ingredients(&mut tx, recipe_id, &ingredients).await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn delete_recipe_in_db(
    pool: &SqlitePool,
    editor: &User,
    recipe_id: i64,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    ensure_can_modify(&mut tx, editor, recipe_id).await?;
    sqlx::query("DELETE FROM recipes WHERE id = ?1")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

async fn ensure_can_modify(
    tx: &mut Transaction<'_, Sqlite>,
    editor: &User,
    recipe_id: i64,
) -> Result<(), RequestError> {
    let author_id = sqlx::query_scalar::<Sqlite, i64>("SELECT author_id FROM recipes WHERE id = ?1")
        .bind(recipe_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RequestError::NotFound("Recipe not found"))?;
    if author_id != editor.id && !editor.is_admin() {
        return Err(RequestError::Forbidden);
    }
    Ok(())
}

async fn ensure_tags_exist(
    tx: &mut Transaction<'_, Sqlite>,
    tags: &[i64],
) -> Result<(), RequestError> {
    let ids = serde_json::to_string(tags).map_err(|e| RequestError::ServerError(e.to_string()))?;
    let found = sqlx::query_scalar::<Sqlite, i64>(
        "SELECT COUNT(*) FROM tags WHERE id IN (SELECT value FROM json_each(?1))",
    )
    .bind(ids)
    .fetch_one(&mut **tx)
    .await?;
    if found != tags.len() as i64 {
        return Err(RequestError::validation("Unknown tag id"));
    }
    Ok(())
}

async fn ensure_ingredients_exist(
    tx: &mut Transaction<'_, Sqlite>,
    ingredients: &[IngredientAmount],
) -> Result<(), RequestError> {
    let ids: Vec<i64> = ingredients.iter().map(|i| i.id).collect();
    let ids = serde_json::to_string(&ids).map_err(|e| RequestError::ServerError(e.to_string()))?;
    let found = sqlx::query_scalar::<Sqlite, i64>(
        "SELECT COUNT(*) FROM ingredients WHERE id IN (SELECT value FROM json_each(?1))",
    )
    .bind(ids)
    .fetch_one(&mut **tx)
    .await?;
    if found != ingredients.len() as i64 {
        return Err(RequestError::NotFound("Ingredient not found"));
    }
    Ok(())
}

async fn insert_recipe_tags(
    tx: &mut Transaction<'_, Sqlite>,
    recipe_id: i64,
    tags: &[i64],
) -> Result<(), RequestError> {
    for tag_id in tags {
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (?1, ?2)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn insert_recipe_ingredients(
    tx: &mut Transaction<'_, Sqlite>,
    recipe_id: i64,
    ingredients: &[IngredientAmount],
) -> Result<(), RequestError> {
    for IngredientAmount { id, amount } in ingredients {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES (?1, ?2, ?3)",
        )
        .bind(recipe_id)
        .bind(id)
        .bind(amount)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_helpers::{add_recipe_relation_in_db, test_utils::*};
    use crate::models::RecipeRelation;

    fn first_page() -> Page {
        Page {
            page: 1,
            limit: 10,
            offset: 0,
        }
    }

    #[tokio::test]
    async fn created_recipe_reads_back_with_tags_and_amounts() {
        let pool = setup_test_db().await;
        let author = create_user(&pool, "author").await;
        let breakfast = create_tag(&pool, "breakfast", "#E26C2D").await;
        let lunch = create_tag(&pool, "lunch", "#49B64E").await;
        let eggs = create_ingredient(&pool, "eggs", "pcs").await;
        let milk = create_ingredient(&pool, "milk", "ml").await;

        let id = create_recipe(
            &pool,
            &author,
            "Omelette",
            vec![breakfast.id, lunch.id],
            &[(eggs.id, 2), (milk.id, 1)],
        )
        .await;

        let recipe = get_recipe_in_db(&pool, None, id).await.unwrap();
        assert_eq!(recipe.recipe.name, "Omelette");
        assert_eq!(recipe.tags, vec![breakfast, lunch]);
        let amounts: Vec<_> = recipe
            .ingredients
            .iter()
            .map(|i| (i.id, i.amount))
            .collect();
        assert_eq!(amounts, vec![(eggs.id, 2), (milk.id, 1)]);
        assert!(!recipe.recipe.is_favorited);
        assert!(!recipe.recipe.is_in_shopping_cart);
    }

    #[tokio::test]
    async fn unknown_ingredient_is_not_found_and_nothing_is_written() {
        let pool = setup_test_db().await;
        let author = create_user(&pool, "author").await;
        let tag = create_tag(&pool, "lunch", "#49B64E").await;

        let error = create_recipe_in_db(
            &pool,
            author.id,
            CreateRecipeRequest {
                name: "Air soup".into(),
                image: None,
                text: "Nothing".into(),
                cooking_time: 1,
                tags: vec![tag.id],
                ingredients: vec![IngredientAmount { id: 999, amount: 1 }],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(error, RequestError::NotFound(_)));

        let (recipes, count) =
            list_recipes_in_db(&pool, None, &RecipeQueryParams::default(), first_page())
                .await
                .unwrap();
        assert!(recipes.is_empty());
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn update_without_ingredients_keeps_them() {
        let pool = setup_test_db().await;
        let author = create_user(&pool, "author").await;
        let tag = create_tag(&pool, "lunch", "#49B64E").await;
        let other_tag = create_tag(&pool, "dinner", "#8775D2").await;
        let flour = create_ingredient(&pool, "flour", "g").await;
        let id = create_recipe(&pool, &author, "Bread", vec![tag.id], &[(flour.id, 500)]).await;

        update_recipe_in_db(
            &pool,
            &author,
            id,
            UpdateRecipeRequest {
                name: Some("Rye bread".into()),
                tags: Some(vec![other_tag.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let recipe = get_recipe_in_db(&pool, None, id).await.unwrap();
        assert_eq!(recipe.recipe.name, "Rye bread");
        assert_eq!(recipe.tags, vec![other_tag]);
        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.ingredients[0].amount, 500);
    }

    #[tokio::test]
    async fn update_with_ingredients_replaces_them() {
        let pool = setup_test_db().await;
        let author = create_user(&pool, "author").await;
        let tag = create_tag(&pool, "lunch", "#49B64E").await;
        let flour = create_ingredient(&pool, "flour", "g").await;
        let salt = create_ingredient(&pool, "salt", "pinch").await;
        let id = create_recipe(&pool, &author, "Bread", vec![tag.id], &[(flour.id, 500)]).await;

        update_recipe_in_db(
            &pool,
            &author,
            id,
            UpdateRecipeRequest {
                ingredients: Some(vec![IngredientAmount {
                    id: salt.id,
                    amount: 2,
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let recipe = get_recipe_in_db(&pool, None, id).await.unwrap();
        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.ingredients[0].name, "salt");
        assert_eq!(recipe.tags.len(), 1);
    }

    #[tokio::test]
    async fn only_the_author_may_edit_or_delete() {
        let pool = setup_test_db().await;
        let author = create_user(&pool, "author").await;
        let stranger = create_user(&pool, "stranger").await;
        let tag = create_tag(&pool, "lunch", "#49B64E").await;
        let flour = create_ingredient(&pool, "flour", "g").await;
        let id = create_recipe(&pool, &author, "Bread", vec![tag.id], &[(flour.id, 500)]).await;

        let error = update_recipe_in_db(&pool, &stranger, id, UpdateRecipeRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(error, RequestError::Forbidden));
        let error = delete_recipe_in_db(&pool, &stranger, id).await.unwrap_err();
        assert!(matches!(error, RequestError::Forbidden));

        delete_recipe_in_db(&pool, &author, id).await.unwrap();
        assert!(matches!(
            get_recipe_in_db(&pool, None, id).await,
            Err(RequestError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_filters_by_tag_author_and_favorites() {
        let pool = setup_test_db().await;
        let alice = create_user(&pool, "alice").await;
        let bob = create_user(&pool, "bob").await;
        let lunch = create_tag(&pool, "lunch", "#49B64E").await;
        let dinner = create_tag(&pool, "dinner", "#8775D2").await;
        let flour = create_ingredient(&pool, "flour", "g").await;
        let soup = create_recipe(&pool, &alice, "Soup", vec![lunch.id], &[(flour.id, 1)]).await;
        let stew = create_recipe(&pool, &bob, "Stew", vec![dinner.id], &[(flour.id, 1)]).await;
        add_recipe_relation_in_db(&pool, alice.id, stew, RecipeRelation::Favorite)
            .await
            .unwrap();

        let by_tag = RecipeQueryParams {
            tags: vec!["lunch".into()],
            ..Default::default()
        };
        let (recipes, count) = list_recipes_in_db(&pool, None, &by_tag, first_page())
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(recipes[0].recipe.id, soup);

        let by_author = RecipeQueryParams {
            author: Some(bob.id),
            ..Default::default()
        };
        let (recipes, _) = list_recipes_in_db(&pool, None, &by_author, first_page())
            .await
            .unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].recipe.id, stew);

        let favorites = RecipeQueryParams {
            is_favorited: true,
            ..Default::default()
        };
        let (recipes, _) = list_recipes_in_db(&pool, Some(alice.id), &favorites, first_page())
            .await
            .unwrap();
        assert_eq!(recipes.len(), 1);
        assert!(recipes[0].recipe.is_favorited);

        // Anonymous viewers can't filter by favorites.
        let (recipes, _) = list_recipes_in_db(&pool, None, &favorites, first_page())
            .await
            .unwrap();
        assert_eq!(recipes.len(), 2);
        assert!(recipes.iter().all(|r| !r.recipe.is_favorited));
    }

    #[tokio::test]
    async fn shopping_cart_flag_and_filter_follow_the_viewer() {
        let pool = setup_test_db().await;
        let alice = create_user(&pool, "alice").await;
        let bob = create_user(&pool, "bob").await;
        let lunch = create_tag(&pool, "lunch", "#49B64E").await;
        let flour = create_ingredient(&pool, "flour", "g").await;
        let soup = create_recipe(&pool, &alice, "Soup", vec![lunch.id], &[(flour.id, 1)]).await;
        create_recipe(&pool, &alice, "Bread", vec![lunch.id], &[(flour.id, 2)]).await;
        add_recipe_relation_in_db(&pool, bob.id, soup, RecipeRelation::ShoppingCart)
            .await
            .unwrap();

        let recipe = get_recipe_in_db(&pool, Some(bob.id), soup).await.unwrap();
        assert!(recipe.recipe.is_in_shopping_cart);
        assert!(!recipe.recipe.is_favorited);
        let recipe = get_recipe_in_db(&pool, Some(alice.id), soup).await.unwrap();
        assert!(!recipe.recipe.is_in_shopping_cart);

        let in_cart = RecipeQueryParams {
            is_in_shopping_cart: true,
            ..Default::default()
        };
        let (recipes, count) = list_recipes_in_db(&pool, Some(bob.id), &in_cart, first_page())
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(recipes[0].recipe.id, soup);
        assert!(recipes[0].recipe.is_in_shopping_cart);

        let (recipes, count) = list_recipes_in_db(&pool, None, &in_cart, first_page())
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert!(recipes.iter().all(|r| !r.recipe.is_in_shopping_cart));
    }
}
