//! # Shared Observable State
//!
//! The single mutable record every connected viewer sees, and the store that
//! guards it. There is exactly one authoritative copy per process; viewers
//! converge to it because every merge re-broadcasts the full post-merge
//! record.
//!
//! ## Thread Safety Pattern:
//! The store is a mutex around the record, shared via `Arc` so every request
//! handler and WebSocket actor holds the same state. A merge is
//! read-modify-merge-broadcast as one logical step: the publish happens while
//! the lock is still held, so two pipeline runs completing close together
//! cannot interleave their broadcasts or lose an update.

use crate::broadcast::Broadcaster;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// The shared record broadcast to all connected viewers.
///
/// Wire names are camelCase because the viewer client and the realtime
/// protocol use them verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedState {
    /// Last completed pipeline output, or the generic failure notice.
    pub response_text: String,

    /// True while a two-stage pipeline run is in flight.
    pub is_loading: bool,

    /// Client-controlled toggle, opaque to the pipeline.
    pub auto_analyze: bool,
}

/// A partial update merged field-by-field over the current state.
///
/// Fields absent from the update are preserved. No validation: any connected
/// viewer may push any subset of fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SharedStateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_loading: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_analyze: Option<bool>,
}

impl SharedStateUpdate {
    /// Update marking a pipeline run as started.
    pub fn loading() -> Self {
        Self {
            is_loading: Some(true),
            ..Self::default()
        }
    }

    /// Update carrying a finished pipeline result (or failure notice).
    pub fn completed(response_text: impl Into<String>) -> Self {
        Self {
            response_text: Some(response_text.into()),
            is_loading: Some(false),
            ..Self::default()
        }
    }

    fn apply(&self, state: &mut SharedState) {
        if let Some(text) = &self.response_text {
            state.response_text = text.clone();
        }
        if let Some(loading) = self.is_loading {
            state.is_loading = loading;
        }
        if let Some(auto) = self.auto_analyze {
            state.auto_analyze = auto;
        }
    }
}

/// In-memory singleton store for [`SharedState`].
///
/// Cheap to clone; all clones share the same record and broadcaster.
#[derive(Clone)]
pub struct SharedStateStore {
    inner: Arc<Mutex<SharedState>>,
    broadcaster: Broadcaster,
}

impl SharedStateStore {
    pub fn new(broadcaster: Broadcaster) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SharedState::default())),
            broadcaster,
        }
    }

    /// Current state, no side effects. Safe to call at any time, including
    /// before any merge has occurred.
    pub fn snapshot(&self) -> SharedState {
        self.inner.lock().unwrap().clone()
    }

    /// Shallow-merge the update over the current state, broadcast the
    /// post-merge state to every subscriber, and return it.
    ///
    /// Always succeeds. Exactly one broadcast per merge.
    pub fn merge(&self, update: SharedStateUpdate) -> SharedState {
        let mut state = self.inner.lock().unwrap();
        update.apply(&mut state);
        let snapshot = state.clone();
        // Publish under the lock so merge + broadcast is atomic relative to
        // other merges. do_send never blocks, so holding the lock is cheap.
        self.broadcaster.publish(&snapshot);
        snapshot
    }

    /// The broadcast channel this store publishes to.
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }
}
