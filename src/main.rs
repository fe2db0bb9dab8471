//! # Study Relay Backend - Main Application Entry Point
//!
//! An Actix-web server that relays classroom images to an OpenAI-compatible
//! vision model, elaborates or classifies the transcript, and fans the shared
//! result out to every connected viewer over WebSocket.
//!
//! ## Application Architecture:
//! - **config**: layered configuration (TOML file + environment variables)
//! - **state**: shared application state wired around the inference client
//! - **shared_state / broadcast**: the observable record and its fan-out
//! - **pipeline**: the one/two-stage inference orchestrator
//! - **inference**: the external chat-completions collaborator
//! - **handlers / websocket / health**: the HTTP and realtime surfaces
//! - **middleware**: request logging and counters
//! - **error**: error taxonomy and HTTP error responses

mod broadcast;
mod config;
mod error;
mod handlers;
mod health;
mod inference;
mod middleware;
mod pipeline;
mod shared_state;
mod state;
mod taxonomy;
mod websocket;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use crate::config::AppConfig;
use crate::inference::OpenAiClient;
use crate::state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Global shutdown signal, set by the signal handlers and polled by main.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    // A missing inference credential fails here, before anything binds.
    config.validate()?;

    info!("Starting study-relay-backend v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: {}:{}, model {}",
        config.server.host, config.server.port, config.inference.model
    );

    let client = Arc::new(OpenAiClient::from_config(&config.inference));
    let app_state = AppState::new(config.clone(), client);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);

    let max_body_bytes = config.limits.max_body_bytes;
    let static_dir = config.server.static_dir.clone();

    let server = HttpServer::new(move || {
        // The viewer client may be served from anywhere, so CORS stays open.
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            // Image batches arrive base64-encoded inside JSON bodies.
            .app_data(web::JsonConfig::default().limit(max_body_bytes))
            .app_data(web::PayloadConfig::new(max_body_bytes))
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::RequestLogging)
            .route("/process_images", web::post().to(handlers::process_images))
            .route(
                "/transcribe_images",
                web::post().to(handlers::transcribe_images),
            )
            .route("/analyze_theme", web::post().to(handlers::analyze_theme))
            .route("/health", web::get().to(health::health_check))
            .route("/ws", web::get().to(websocket::state_websocket))
            // Bundled viewer client; unmatched GETs fall through to index.html.
            .service(
                actix_files::Files::new("/", static_dir.clone())
                    .index_file("index.html")
                    .default_handler(web::get().to(handlers::spa_index)),
            )
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(server_result) => {
                    if let Err(e) = server_result {
                        error!("Server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Server task error: {}", e);
                }
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Initialize the tracing (logging) system for the application.
///
/// `RUST_LOG` controls the filter; the default keeps this crate at debug and
/// the framework at info.
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "study_relay_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// Listen for SIGTERM/SIGINT and flip the global shutdown flag.
fn setup_signal_handlers() {
    tokio::spawn(async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

/// Poll the shutdown flag until it is set.
async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}
