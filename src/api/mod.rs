//! HTTP surface: route table, extractor configuration and API documentation.

pub mod docs;
pub mod models;
pub mod profile;
pub mod subscriptions;

use actix_web::{web, HttpRequest, Scope};
use std::fmt::Display;

use self::profile::{change_password, profile, update_profile};
use self::subscriptions::{notifications, subscribe, subscriptions, unsubscribe};
use crate::auth::handlers::{signin, signup};
use crate::error::AppError;

/// Registers every route. Paths are given without trailing slashes; the
/// server normalises incoming paths before routing.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default().error_handler(unprocessable);
    let form = web::FormConfig::default().error_handler(unprocessable);

    cfg.app_data(json)
        .app_data(form)
        .route("/health", web::get().to(crate::health_check))
        .route("/docs", web::get().to(docs::docs))
        .route("/openapi.yaml", web::get().to(docs::openapi_spec))
        .service(api_scope());
}

fn api_scope() -> Scope {
    web::scope("/api")
        .route("/signin", web::post().to(signin))
        .route("/signup", web::post().to(signup))
        .route("/profile", web::get().to(profile))
        .route("/update_profile", web::patch().to(update_profile))
        .route("/change_password", web::put().to(change_password))
        .route("/subscriptions", web::get().to(subscriptions))
        .route("/notifications", web::get().to(notifications))
        .route("/subscribe", web::post().to(subscribe))
        .route("/unsubscribe", web::delete().to(unsubscribe))
}

/// Malformed bodies are reported like any other validation failure.
fn unprocessable<E: Display>(err: E, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}
