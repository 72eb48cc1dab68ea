// Socket event envelope: `{"event": <name>, "data": <payload>}` text frames.

use serde::{Deserialize, Serialize};

use crate::model::{RoverCommand, TelemetrySnapshot};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum SocketEvent {
    #[serde(rename = "rover:telemetry")]
    Telemetry(TelemetrySnapshot),
    #[serde(rename = "rover:command")]
    Command(RoverCommand),
}

impl SocketEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SocketEvent::Telemetry(_) => crate::constants::TELEMETRY_EVENT,
            SocketEvent::Command(_) => crate::constants::COMMAND_EVENT,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
