use std::net::TcpListener;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::middleware::{Logger, NormalizePath, TrailingSlash};
use actix_web::{web, App, HttpServer};
use tracing::info;

use crate::{api, AppError, AppState, Result, Settings};

/// Connects to the database and serves until the process receives SIGINT/SIGTERM.
pub async fn run(settings: Settings) -> Result<()> {
    let address = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState::new(settings).await?;

    let listener = TcpListener::bind(&address)?;
    info!("Listening on http://{address} (docs at /docs)");

    let maintenance = spawn_maintenance(state.clone());
    let result = build_server(state.clone(), listener)?
        .await
        .map_err(|e| AppError::InternalError(e.to_string()));

    maintenance.abort();
    state.shutdown().await?;
    info!("Server stopped");
    result
}

/// Builds the HTTP server on an already bound listener without starting it.
pub fn build_server(state: AppState, listener: TcpListener) -> Result<Server> {
    let workers = state.config.server.workers.max(1) as usize;
    let permissive_cors = state.config.environment != "production";
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = if permissive_cors {
            Cors::permissive()
        } else {
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
                .allowed_headers(vec!["Authorization", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::configure)
    })
    .listen(listener)?
    .workers(workers)
    .run();

    Ok(server)
}

/// Periodically drops stale signin rate-limit windows.
fn spawn_maintenance(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            state.auth_service.cleanup().await;
        }
    })
}
