pub mod api;
pub mod auth;
pub mod birthdays;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod provision;
pub mod server;

use actix_web::{web, HttpResponse};
use std::sync::Arc;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, AuthorizedUser, RateLimitConfig, RateLimiter};
pub use db::{DbOperations, Profile, Subscription, User};

/// Health check endpoint handler
/// Returns a JSON response with server status, timestamp and pool usage
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "database": state.db.get_pool_status(),
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db: DbOperations,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let db = DbOperations::connect(&config.database).await?;
        Self::with_db(config, db)
    }

    pub fn with_db(config: Settings, db: DbOperations) -> Result<Self> {
        let auth_service = AuthService::new(db.clone(), &config.auth)?;

        Ok(Self {
            config: Arc::new(config),
            db,
            auth_service: Arc::new(auth_service),
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.db.close().await;
        Ok(())
    }
}
