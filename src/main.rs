// ABOUTME: Main entry point for the home inventory web app
// ABOUTME: Loads configuration, prepares the database, and serves the routes

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod attachments;
mod config;
mod entities;
mod error;
mod filters;
mod flash;
mod handlers;
mod middleware;
mod migration;
mod storage;
mod types;
mod validation;
mod views;

#[cfg(test)]
mod integration_tests;

use config::Config;
use storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub config: Arc<Config>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(storage: Storage, config: Config) -> Self {
        let cookie_key = flash::signing_key(&config.secret_key);
        Self {
            storage: Arc::new(storage),
            config: Arc::new(config),
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.max_content_length;

    Router::new()
        .route("/", get(handlers::index))
        .route("/add", get(handlers::add_form).post(handlers::add_item))
        .route(
            "/edit/:id",
            get(handlers::edit_form).post(handlers::edit_item),
        )
        .route("/delete/:id", post(handlers::delete_item))
        .route("/attachment/:id", get(handlers::download_attachment))
        .route("/attachment/:id/delete", post(handlers::delete_attachment))
        .route(
            "/attachments/delete",
            post(handlers::bulk_delete_attachments),
        )
        .route("/api/items", get(handlers::api_items))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "home_inventory=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    if config.secret_key == config::DEFAULT_SECRET_KEY {
        tracing::warn!("SECRET_KEY is not set; using the development default");
    }

    tracing::info!("Opening database at {}", config.database_url);
    let storage = Storage::connect(&config.database_url, config.upload_folder.clone()).await?;
    tracing::info!(
        "Storing attachments in {} (max upload {} bytes)",
        config.upload_folder.display(),
        config.max_content_length
    );

    let addr = config.server_addr();
    let app = build_router(AppState::new(storage, config));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
