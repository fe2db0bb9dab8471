//! # Application State Management
//!
//! Everything shared across concurrent HTTP requests and WebSocket
//! connections hangs off [`AppState`]: the configuration, the shared
//! observable record and its broadcast channel, the pipeline orchestrator,
//! and the request counters surfaced by `/health`.
//!
//! ## Thread Safety Pattern:
//! `Arc<RwLock<T>>` for data that every request reads and rarely writes
//! (config, metrics); the shared record has its own mutex inside
//! [`SharedStateStore`] because its merges must be atomic with their
//! broadcast.

use crate::broadcast::Broadcaster;
use crate::config::AppConfig;
use crate::inference::InferenceClient;
use crate::pipeline::Pipeline;
use crate::shared_state::SharedStateStore;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// The main application state shared with all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<RwLock<AppConfig>>,

    /// The process-wide shared record viewers observe.
    pub shared: SharedStateStore,

    /// Registry of live viewer connections.
    pub broadcaster: Broadcaster,

    /// Orchestrator for the inference pipelines.
    pub pipeline: Arc<Pipeline>,

    /// Request/error counters (updated by middleware on every request).
    pub metrics: Arc<RwLock<AppMetrics>>,

    /// When the server started.
    pub start_time: Instant,
}

/// Counters collected across all HTTP requests.
#[derive(Debug, Default, Clone)]
pub struct AppMetrics {
    /// Total number of HTTP requests processed since server start.
    pub request_count: u64,

    /// Total number of error responses since server start.
    pub error_count: u64,
}

impl AppState {
    /// Wire up the shared store, broadcast channel and pipeline around the
    /// given inference client.
    pub fn new(config: AppConfig, client: Arc<dyn InferenceClient>) -> Self {
        let broadcaster = Broadcaster::new();
        let shared = SharedStateStore::new(broadcaster.clone());
        let pipeline = Arc::new(Pipeline::new(
            client,
            shared.clone(),
            config.inference.image_detail.clone(),
        ));

        Self {
            config: Arc::new(RwLock::new(config)),
            shared,
            broadcaster,
            pipeline,
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            start_time: Instant::now(),
        }
    }

    /// Get a copy of the current configuration.
    ///
    /// Cloning releases the lock immediately so other requests are never
    /// blocked on it; `AppConfig` is cheap to clone.
    pub fn get_config(&self) -> AppConfig {
        self.config.read().unwrap().clone()
    }

    pub fn increment_request_count(&self) {
        self.metrics.write().unwrap().request_count += 1;
    }

    pub fn increment_error_count(&self) {
        self.metrics.write().unwrap().error_count += 1;
    }

    /// Consistent copy of the counters for the health endpoint.
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        self.metrics.read().unwrap().clone()
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
