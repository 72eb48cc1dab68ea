// Socket transport for the live telemetry feed and operator commands.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use futures::StreamExt;
use tracing::{debug, info, warn};

use rover_telemetry_core::{RoverCommand, SocketEvent};

use crate::app::AppState;
use crate::tasks::TelemetryEmitter;

pub async fn ws_handler(
    AxumState(app_state): AxumState<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(mut socket: WebSocket, app_state: AppState) {
    let connection = app_state.connections.open();
    let conn_id = connection.id();
    info!(conn_id, active = app_state.connections.active(), "client connected");

    let (emitter, mut snapshots) = TelemetryEmitter::spawn(app_state.telemetry_interval);

    loop {
        tokio::select! {
            outbound = snapshots.recv() => {
                let Some(snapshot) = outbound else { break };
                let payload = match SocketEvent::Telemetry(snapshot).encode() {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!(?err, "failed to encode telemetry");
                        continue;
                    }
                };
                if socket.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            inbound = socket.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => handle_client_event(&app_state, conn_id, &text),
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(conn_id, ?err, "ws error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    let emitted = emitter.stop().await;
    drop(connection);
    info!(conn_id, emitted, "client disconnected");
}

fn handle_client_event(app_state: &AppState, conn_id: u64, text: &str) {
    match SocketEvent::decode(text) {
        Ok(SocketEvent::Command(command)) => handle_command(app_state, conn_id, command),
        Ok(other) => debug!(conn_id, event = other.name(), "ignoring client event"),
        Err(err) => debug!(conn_id, %err, "ignoring malformed client frame"),
    }
}

/// Commands are acknowledged in the log only; nothing actuates the rover.
fn handle_command(app_state: &AppState, conn_id: u64, command: RoverCommand) {
    app_state.connections.record_command();
    info!(conn_id, command = %command.kind, "rover command received");
}
