use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use sqlx::SqlitePool;

use crate::{
    data_formats::{IngredientQueryParams, IngredientResponse, TagResponse},
    db_helpers::{
        get_ingredient_by_id_in_db, get_tag_by_id_in_db, get_tags_in_db, search_ingredients_in_db,
    },
};

use super::ApiResult;

// ----------------- Tag Handlers -----------------
pub async fn list_tags(
    Extension(pool): Extension<Arc<SqlitePool>>,
) -> ApiResult<Json<Vec<TagResponse>>> {
    let tags = get_tags_in_db(&pool).await?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

pub async fn get_tag(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TagResponse>> {
    Ok(Json(get_tag_by_id_in_db(&pool, id).await?.into()))
}

// ----------------- Ingredient Handlers -----------------
pub async fn list_ingredients(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Query(params): Query<IngredientQueryParams>,
) -> ApiResult<Json<Vec<IngredientResponse>>> {
    let ingredients = search_ingredients_in_db(&pool, params.name.as_deref()).await?;
    Ok(Json(ingredients.into_iter().map(Into::into).collect()))
}

pub async fn get_ingredient(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<IngredientResponse>> {
    Ok(Json(get_ingredient_by_id_in_db(&pool, id).await?.into()))
}
