use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};
use sqlx::SqlitePool;

use crate::{
    authentication::{
        get_jwt_token, hash_password_argon2, verify_password_argon2, AuthUser, MaybeUser,
    },
    config::Config,
    data_formats::{
        LoginRequest, Paginated, PaginationParams, RegisterRequest, RegisteredUserResponse,
        SetPasswordRequest, SubscriptionQueryParams, SubscriptionResponse, TokenResponse,
        UserResponse,
    },
    db_helpers::{
        follow_user_in_db, get_author_recipes_preview_in_db, get_authenticated_user,
        get_profile_in_db, get_user_by_email, insert_user, list_profiles_in_db,
        list_subscriptions_in_db, unfollow_user_in_db, update_password_in_db,
    },
    errors::RequestError,
    models::Profile,
};

use super::{created, ApiResult, Created};

const USERS_PATH: &str = "/api/users/";
const SUBSCRIPTIONS_PATH: &str = "/api/users/subscriptions/";

// ----------------- Token Handlers -----------------
pub async fn login_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(config): Extension<Arc<Config>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let invalid = || RequestError::validation("Unable to log in with provided credentials");
    let user = get_user_by_email(&pool, request.email.trim())
        .await?
        .ok_or_else(invalid)?;

    let is_password_correct = verify_password_argon2(request.password, user.password)
        .await
        .map_err(|e| RequestError::ServerError(e.to_string()))?;
    if !is_password_correct {
        return Err(invalid());
    }

    let auth_token = get_jwt_token(&config.jwt_secret, user.id)
        .map_err(|e| RequestError::ServerError(e.to_string()))?;
    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse { auth_token }))
}

/// Tokens are stateless; logging out only requires a valid one.
pub async fn logout_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id }: AuthUser,
) -> ApiResult<StatusCode> {
    let user = get_authenticated_user(&pool, id).await?;
    tracing::debug!(user_id = user.id, "user logged out");
    Ok(StatusCode::NO_CONTENT)
}

// ----------------- User Handlers -----------------
pub async fn register_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Json(mut user): Json<RegisterRequest>,
) -> ApiResult<Created<RegisteredUserResponse>> {
    user.validate()?;
    user.password = hash_password_argon2(user.password)
        .await
        .map_err(|e| RequestError::ServerError(e.to_string()))?;

    let user = insert_user(&pool, &user).await?;
    tracing::info!(user_id = user.id, "user registered");
    Ok(created(user.into()))
}

pub async fn list_users(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(config): Extension<Arc<Config>>,
    maybe_user: MaybeUser,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<Paginated<UserResponse>>> {
    let page = params.resolve(config.page_size);
    let (profiles, count) = list_profiles_in_db(&pool, maybe_user.get_id(), page).await?;
    Ok(Json(
        Paginated::new(profiles, count, page, USERS_PATH).map(UserResponse::from),
    ))
}

pub async fn get_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserResponse>> {
    let profile = get_profile_in_db(&pool, maybe_user.get_id(), id).await?;
    Ok(Json(profile.into()))
}

pub async fn get_current_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id }: AuthUser,
) -> ApiResult<Json<UserResponse>> {
    let user = get_authenticated_user(&pool, id).await?;
    let profile = get_profile_in_db(&pool, Some(user.id), user.id).await?;
    Ok(Json(profile.into()))
}

pub async fn set_password(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id }: AuthUser,
    Json(request): Json<SetPasswordRequest>,
) -> ApiResult<StatusCode> {
    request.validate()?;
    let user = get_authenticated_user(&pool, id).await?;
    let is_password_correct = verify_password_argon2(request.current_password, user.password)
        .await
        .map_err(|e| RequestError::ServerError(e.to_string()))?;
    if !is_password_correct {
        return Err(RequestError::validation("Current password is incorrect"));
    }

    let hash = hash_password_argon2(request.new_password)
        .await
        .map_err(|e| RequestError::ServerError(e.to_string()))?;
    update_password_in_db(&pool, id, &hash).await?;
    tracing::info!(user_id = id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

// ----------------- Subscription Handlers -----------------
pub async fn subscribe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: follower_id }: AuthUser,
    Path(author_id): Path<i64>,
    Query(params): Query<SubscriptionQueryParams>,
) -> ApiResult<Created<SubscriptionResponse>> {
    let follower = get_authenticated_user(&pool, follower_id).await?;
    let author = follow_user_in_db(&pool, follower.id, author_id).await?;
    let subscription = with_recipes_preview(&pool, author, params.recipes_limit()).await?;
    Ok(created(subscription))
}

pub async fn unsubscribe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: follower_id }: AuthUser,
    Path(author_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let follower = get_authenticated_user(&pool, follower_id).await?;
    unfollow_user_in_db(&pool, follower.id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_subscriptions(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(config): Extension<Arc<Config>>,
    AuthUser { id }: AuthUser,
    Query(params): Query<SubscriptionQueryParams>,
) -> ApiResult<Json<Paginated<SubscriptionResponse>>> {
    let user = get_authenticated_user(&pool, id).await?;
    let page = params.pagination().resolve(config.page_size);
    let (authors, count) = list_subscriptions_in_db(&pool, user.id, page).await?;

    let mut results = Vec::with_capacity(authors.len());
    for author in authors {
        results.push(with_recipes_preview(&pool, author, params.recipes_limit()).await?);
    }
    Ok(Json(Paginated::new(results, count, page, SUBSCRIPTIONS_PATH)))
}

async fn with_recipes_preview(
    pool: &SqlitePool,
    author: Profile,
    recipes_limit: u32,
) -> ApiResult<SubscriptionResponse> {
    let (recipes, recipes_count) =
        get_author_recipes_preview_in_db(pool, author.id, recipes_limit).await?;
    Ok(SubscriptionResponse::new(author, recipes, recipes_count))
}
