#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the StormEvents query service.
//!
//! Serves `/health`, `/events`, and `/events/summary` over the backend
//! selected at startup (Athena or local `DuckDB` Parquet). Each request is
//! handled independently with no shared mutable state; the only suspension
//! point is the Athena poll loop, which sleeps between polls without
//! blocking unrelated requests.

mod handlers;
pub mod service;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use storm_api_backend::config::Config;

use crate::service::EventService;

/// Shared application state.
pub struct AppState {
    /// The query service over the configured backend.
    pub service: EventService,
}

/// Starts the StormEvents API server.
///
/// Builds the configured backend once, wraps it in the query service, and
/// serves until shutdown. This is a regular async function — the caller
/// provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
pub async fn run_server(config: Config) -> std::io::Result<()> {
    log::info!("Connecting {:?} backend...", config.backend);
    let backend = storm_api_backend::connect(&config).await;

    let state = web::Data::new(AppState {
        service: EventService::new(backend, config.limits),
    });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .route("/health", web::get().to(handlers::health))
            .route("/events", web::get().to(handlers::events))
            .route("/events/summary", web::get().to(handlers::events_summary))
    })
    .bind((config.bind_addr.clone(), config.port))?
    .run()
    .await
}
