mod authentication;
mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod models;
mod shopping_list;

use anyhow::Context;
pub use anyhow::Result;
use axum::extract::MatchedPath;
use axum::http::{Request, StatusCode};
use axum::{routing::*, Extension, Json, Router};
pub use config::Config;
pub use data_formats::*;
pub use db_helpers::{
    insert_ingredient, insert_tag, load_ingredients_fixture, load_tags_fixture,
};
pub use errors::RequestError;
use handlers::*;
pub use models::{Ingredient, NewIngredient, NewTag, Tag};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::{net::TcpListener, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

pub type JsonResponse<T> = (StatusCode, Json<T>);

/// Opens the database, applies migrations and loads any configured
/// fixtures, then returns the ready router.
pub async fn build_app(config: Arc<Config>) -> Result<Router> {
    let db = init_db(&config.database_url).await?;
    if let Some(path) = &config.tags_fixture {
        let loaded = load_tags_fixture(&db, path).await?;
        info!(loaded, path = %path.display(), "tags fixture processed");
    }
    if let Some(path) = &config.ingredients_fixture {
        let loaded = load_ingredients_fixture(&db, path).await?;
        info!(loaded, path = %path.display(), "ingredients fixture processed");
    }
    Ok(make_router(db, config))
}

pub async fn run_app(app: Router, listener: TcpListener) -> Result<()> {
    info!(address = %listener.local_addr()?, "server listening");
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        info!("Creating database {}", db_url);
        Sqlite::create_database(db_url)
            .await
            .with_context(|| format!("Failed to create database {db_url}"))?;
    } else {
        info!("Database already exists");
    }
    let pool = SqlitePool::connect(db_url)
        .await
        .with_context(|| format!("Failed to connect to {db_url}"))?;
    info!("Running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");
    Ok(pool)
}

pub fn make_router(pool: SqlitePool, config: Arc<Config>) -> Router {
    let api = Router::new()
        .route("/auth/token/login/", post(login_user))
        .route("/auth/token/logout/", post(logout_user))
        .route("/users/", get(list_users).post(register_user))
        .route("/users/me/", get(get_current_user))
        .route("/users/set_password/", post(set_password))
        .route("/users/subscriptions/", get(list_subscriptions))
        .route("/users/:id/", get(get_user))
        .route("/users/:id/subscribe/", post(subscribe).delete(unsubscribe))
        .route("/tags/", get(list_tags))
        .route("/tags/:id/", get(get_tag))
        .route("/ingredients/", get(list_ingredients))
        .route("/ingredients/:id/", get(get_ingredient))
        .route("/recipes/", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/download_shopping_cart/",
            get(download_shopping_cart),
        )
        .route(
            "/recipes/:id/",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route(
            "/recipes/:id/favorite/",
            post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/recipes/:id/shopping_cart/",
            post(add_to_shopping_cart).delete(remove_from_shopping_cart),
        );

    Router::new()
        .route("/check_health", get(alive))
        .nest("/api", api)
        .fallback(not_found)
        .layer(Extension(Arc::new(pool)))
        .layer(Extension(config))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or(request.uri().path());
                tracing::info_span!("http_request", method = %request.method(), path = %path)
            }),
        )
}
