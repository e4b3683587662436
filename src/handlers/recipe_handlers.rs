use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use sqlx::SqlitePool;

use crate::{
    authentication::{AuthUser, MaybeUser},
    config::Config,
    data_formats::{
        CreateRecipeRequest, Paginated, RecipeQueryParams, RecipeResponse, RecipeShortResponse,
        UpdateRecipeRequest,
    },
    db_helpers::{
        add_recipe_relation_in_db, create_recipe_in_db, delete_recipe_in_db,
        get_authenticated_user, get_recipe_in_db, get_shopping_list_in_db, list_recipes_in_db,
        remove_recipe_relation_in_db, update_recipe_in_db,
    },
    errors::RequestError,
    models::RecipeRelation,
    shopping_list::render_shopping_list,
};

use super::{created, ApiResult, Created};

const RECIPES_PATH: &str = "/api/recipes/";
const SHOPPING_LIST_DISPOSITION: &str = "attachment; filename=\"shopping_list.pdf\"";

// ----------------- Recipe Handlers -----------------
pub async fn list_recipes(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(config): Extension<Arc<Config>>,
    maybe_user: MaybeUser,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Paginated<RecipeResponse>>> {
    let params = RecipeQueryParams::from_pairs(pairs)?;
    let page = params.page(config.page_size);
    let (recipes, count) = list_recipes_in_db(&pool, maybe_user.get_id(), &params, page).await?;
    Ok(Json(
        Paginated::new(recipes, count, page, RECIPES_PATH).map(RecipeResponse::from),
    ))
}

pub async fn get_recipe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<RecipeResponse>> {
    let recipe = get_recipe_in_db(&pool, maybe_user.get_id(), id).await?;
    Ok(Json(recipe.into()))
}

pub async fn create_recipe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id }: AuthUser,
    Json(request): Json<CreateRecipeRequest>,
) -> ApiResult<Created<RecipeResponse>> {
    request.validate()?;
    let author = get_authenticated_user(&pool, id).await?;
    let recipe_id = create_recipe_in_db(&pool, author.id, request).await?;
    let recipe = get_recipe_in_db(&pool, Some(author.id), recipe_id).await?;
    Ok(created(recipe.into()))
}

pub async fn update_recipe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id }: AuthUser,
    Path(recipe_id): Path<i64>,
    Json(request): Json<UpdateRecipeRequest>,
) -> ApiResult<Json<RecipeResponse>> {
    request.validate()?;
    let editor = get_authenticated_user(&pool, id).await?;
    update_recipe_in_db(&pool, &editor, recipe_id, request).await?;
    let recipe = get_recipe_in_db(&pool, Some(editor.id), recipe_id).await?;
    Ok(Json(recipe.into()))
}

pub async fn delete_recipe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id }: AuthUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let editor = get_authenticated_user(&pool, id).await?;
    delete_recipe_in_db(&pool, &editor, recipe_id).await?;
    tracing::info!(recipe_id, user_id = editor.id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ----------------- Favorite and Shopping Cart Handlers -----------------
pub async fn add_favorite(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id }: AuthUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<Created<RecipeShortResponse>> {
    add_relation(&pool, id, recipe_id, RecipeRelation::Favorite).await
}

pub async fn remove_favorite(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id }: AuthUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<StatusCode> {
    remove_relation(&pool, id, recipe_id, RecipeRelation::Favorite).await
}

pub async fn add_to_shopping_cart(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id }: AuthUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<Created<RecipeShortResponse>> {
    add_relation(&pool, id, recipe_id, RecipeRelation::ShoppingCart).await
}

pub async fn remove_from_shopping_cart(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id }: AuthUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<StatusCode> {
    remove_relation(&pool, id, recipe_id, RecipeRelation::ShoppingCart).await
}

async fn add_relation(
    pool: &SqlitePool,
    user_id: i64,
    recipe_id: i64,
    relation: RecipeRelation,
) -> ApiResult<Created<RecipeShortResponse>> {
    let user = get_authenticated_user(pool, user_id).await?;
    let recipe = add_recipe_relation_in_db(pool, user.id, recipe_id, relation).await?;
    Ok(created(recipe.into()))
}

async fn remove_relation(
    pool: &SqlitePool,
    user_id: i64,
    recipe_id: i64,
    relation: RecipeRelation,
) -> ApiResult<StatusCode> {
    let user = get_authenticated_user(pool, user_id).await?;
    remove_recipe_relation_in_db(pool, user.id, recipe_id, relation).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_shopping_cart(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id }: AuthUser,
) -> ApiResult<Response> {
    let user = get_authenticated_user(&pool, id).await?;
    let items = get_shopping_list_in_db(&pool, user.id).await?;
    tracing::debug!(user_id = user.id, lines = items.len(), "rendering shopping list");
    let pdf = tokio::task::spawn_blocking(move || render_shopping_list(&items))
        .await
        .map_err(|e| RequestError::ServerError(e.to_string()))?
        .map_err(|e| RequestError::ServerError(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, SHOPPING_LIST_DISPOSITION),
        ],
        pdf,
    )
        .into_response())
}
