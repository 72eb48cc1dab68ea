// Socket client that feeds live telemetry into a TelemetrySink.
// Invariants: the sink is only touched from the task driving `run`;
// reconnects resume appending without marking the gap.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use rover_telemetry_core::constants::SOCKET_PATH;
use rover_telemetry_core::{RoverCommand, SocketEvent, TelemetrySink};

use super::{base_url, ClientError};
use crate::constants::{RECONNECT_ATTEMPTS, RECONNECT_DELAY_MS};
use crate::utils::now_epoch_ms;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Pump {
    Shutdown,
    Disconnected,
}

pub struct TelemetryFeed {
    url: String,
    sink: TelemetrySink,
    max_attempts: u32,
    retry_delay: Duration,
}

impl TelemetryFeed {
    pub fn new(server: &str) -> Result<Self, ClientError> {
        let base = base_url(server)?;
        let url = match base.strip_prefix("https://") {
            Some(rest) => format!("wss://{rest}{SOCKET_PATH}"),
            None => format!("ws://{}{SOCKET_PATH}", base.trim_start_matches("http://")),
        };
        Ok(Self {
            url,
            sink: TelemetrySink::new(),
            max_attempts: RECONNECT_ATTEMPTS,
            retry_delay: Duration::from_millis(RECONNECT_DELAY_MS),
        })
    }

    /// Consecutive failed connection attempts tolerated before `run` gives up.
    pub fn with_retry(mut self, max_attempts: u32, delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = delay;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn sink(&self) -> &TelemetrySink {
        &self.sink
    }

    pub fn into_sink(self) -> TelemetrySink {
        self.sink
    }

    /// Streams telemetry until the command sender is dropped or reconnection
    /// is exhausted. `on_update` sees the sink after every change.
    pub async fn run<F>(
        &mut self,
        mut commands: mpsc::Receiver<RoverCommand>,
        mut on_update: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(&TelemetrySink),
    {
        let mut failures = 0u32;
        loop {
            let mut socket = match connect_async(self.url.as_str()).await {
                Ok((socket, _)) => socket,
                Err(err) => {
                    failures += 1;
                    warn!(url = %self.url, attempt = failures, %err, "telemetry connect failed");
                    if failures >= self.max_attempts {
                        return Err(ClientError::RetriesExhausted { attempts: failures });
                    }
                    if commands.is_closed() {
                        info!("telemetry feed abandoned before connecting");
                        return Ok(());
                    }
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
            };
            failures = 0;

            info!(url = %self.url, "telemetry feed connected");
            self.sink.set_connected(true);
            on_update(&self.sink);

            let outcome = self.pump(&mut socket, &mut commands, &mut on_update).await;
            self.sink.set_connected(false);
            on_update(&self.sink);

            match outcome {
                Ok(Pump::Shutdown) => {
                    let _ = socket.close(None).await;
                    info!("telemetry feed closed");
                    return Ok(());
                }
                Ok(Pump::Disconnected) => info!("telemetry feed disconnected"),
                Err(err) => warn!(%err, "telemetry feed dropped"),
            }
            if commands.is_closed() {
                info!("telemetry feed closed");
                return Ok(());
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn pump<F>(
        &mut self,
        socket: &mut Socket,
        commands: &mut mpsc::Receiver<RoverCommand>,
        on_update: &mut F,
    ) -> Result<Pump, ClientError>
    where
        F: FnMut(&TelemetrySink),
    {
        loop {
            tokio::select! {
                frame = socket.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if self.handle_frame(&text) {
                            on_update(&self.sink);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(Pump::Disconnected),
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err.into()),
                },
                command = commands.recv() => match command {
                    Some(command) => {
                        self.sink.apply_command(command, now_epoch_ms());
                        let frame = SocketEvent::Command(command).encode()?;
                        socket.send(Message::Text(frame)).await?;
                        on_update(&self.sink);
                    }
                    None => return Ok(Pump::Shutdown),
                },
            }
        }
    }

    fn handle_frame(&mut self, text: &str) -> bool {
        match SocketEvent::decode(text) {
            Ok(SocketEvent::Telemetry(snapshot)) => {
                self.sink.on_snapshot(snapshot, now_epoch_ms());
                true
            }
            Ok(other) => {
                debug!(event = other.name(), "ignoring server event");
                false
            }
            Err(err) => {
                debug!(%err, "ignoring malformed frame");
                false
            }
        }
    }
}
