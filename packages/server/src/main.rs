#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Binary entrypoint for the StormEvents API server.

use storm_api_backend::config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = Config::from_env().unwrap_or_else(|e| {
        log::error!("Configuration error: {e}");
        std::process::exit(1);
    });

    storm_api_server::run_server(config).await
}
