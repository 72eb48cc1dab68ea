// Telemetry snapshot pushed to dashboards on every emitter tick.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub distance: f64,
    pub angle: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    Online,
    Offline,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Online => "ONLINE",
            LinkStatus::Offline => "OFFLINE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoverMode {
    Manual,
    Autonomous,
    Standby,
    Emergency,
    Calibrating,
}

impl RoverMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoverMode::Manual => "MANUAL",
            RoverMode::Autonomous => "AUTONOMOUS",
            RoverMode::Standby => "STANDBY",
            RoverMode::Emergency => "EMERGENCY",
            RoverMode::Calibrating => "CALIBRATING",
        }
    }
}

/// One synthetic reading. Field names follow the dashboard wire format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub battery: f64,
    pub speed: f64,
    pub coordinates: Coordinates,
    pub orientation: Orientation,
    pub status: LinkStatus,
    pub mode: RoverMode,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl TelemetrySnapshot {
    pub fn has_obstacles(&self) -> bool {
        !self.obstacles.is_empty()
    }
}
