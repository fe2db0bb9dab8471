//! # WebSocket State Channel
//!
//! One persistent bidirectional connection per viewer at `GET /ws`. Each
//! connection is an independent actor that registers itself with the
//! broadcast channel on start and unregisters on stop.
//!
//! ## Protocol (JSON text frames, tagged by `type`):
//! - **Client → Server** `{"type":"getState"}` — push the current shared
//!   state to this connection only.
//! - **Client → Server** `{"type":"updateState","state":{...}}` — merge the
//!   partial state into the store; the post-merge state is broadcast to every
//!   connection, sender included.
//! - **Server → Client** `{"type":"stateUpdate","state":{...}}` — the full
//!   shared state, sent on every merge and on snapshot requests.
//! - **Server → Client** `{"type":"error","message":"..."}` — the last frame
//!   could not be parsed; connection stays open.

use crate::broadcast::StatePush;
use crate::shared_state::{SharedState, SharedStateUpdate};
use crate::state::AppState;
use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use actix_web_actors::ws;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How often the server pings idle connections.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// How long without any client traffic before the connection is dropped.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Messages a viewer may send.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Request a snapshot push to this connection only.
    GetState,

    /// Merge a partial state into the shared record and broadcast.
    UpdateState { state: SharedStateUpdate },
}

/// Messages the server sends.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Full shared state, on every merge and on snapshot requests.
    StateUpdate { state: SharedState },

    /// The previous inbound frame was not understood.
    Error { message: String },
}

/// WebSocket actor representing one connected viewer.
pub struct StateWebSocket {
    app_state: web::Data<AppState>,

    /// Handle in the broadcast registry, set once the actor has started.
    subscriber_id: Option<Uuid>,

    last_heartbeat: Instant,
}

impl StateWebSocket {
    pub fn new(app_state: web::Data<AppState>) -> Self {
        Self {
            app_state,
            subscriber_id: None,
            last_heartbeat: Instant::now(),
        }
    }

    fn send_server_message(&self, ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMessage) {
        if let Ok(json) = serde_json::to_string(msg) {
            ctx.text(json);
        }
    }

    /// Push the current shared state to this connection only.
    fn handle_get_state(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let state = self.app_state.shared.snapshot();
        self.send_server_message(ctx, &ServerMessage::StateUpdate { state });
    }

    /// Merge the viewer's partial update; the broadcast (which includes this
    /// connection) happens inside the store.
    fn handle_update_state(&self, update: SharedStateUpdate) {
        self.app_state.shared.merge(update);
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                warn!("Viewer heartbeat timeout, closing connection");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for StateWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let id = self
            .app_state
            .broadcaster
            .subscribe(ctx.address().recipient());
        self.subscriber_id = Some(id);
        info!(subscriber = %id, "Viewer connected");

        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(id) = self.subscriber_id.take() {
            self.app_state.broadcaster.unsubscribe(id);
            info!(subscriber = %id, "Viewer disconnected");
        }
    }
}

/// Deliver broadcast state pushes to this connection.
impl Handler<StatePush> for StateWebSocket {
    type Result = ();

    fn handle(&mut self, msg: StatePush, ctx: &mut Self::Context) {
        self.send_server_message(ctx, &ServerMessage::StateUpdate { state: msg.0 });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for StateWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::GetState) => {
                    debug!("Viewer requested state snapshot");
                    self.handle_get_state(ctx);
                }
                Ok(ClientMessage::UpdateState { state }) => {
                    debug!("Viewer pushed state update");
                    self.handle_update_state(state);
                }
                Err(err) => {
                    self.send_server_message(
                        ctx,
                        &ServerMessage::Error {
                            message: format!("Invalid message: {}", err),
                        },
                    );
                }
            },
            Ok(ws::Message::Ping(data)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&data);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Viewer connection closed: {:?}", reason);
                ctx.stop();
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Ignoring unexpected binary frame");
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(err) => {
                warn!("WebSocket protocol error: {}", err);
                ctx.stop();
            }
        }
    }
}

/// WebSocket endpoint handler: upgrades the HTTP request and hands the
/// connection to a new [`StateWebSocket`] actor.
pub async fn state_websocket(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    info!(
        peer = ?req.connection_info().peer_addr(),
        "New viewer connection request"
    );
    ws::start(StateWebSocket::new(app_state), &req, stream)
}
