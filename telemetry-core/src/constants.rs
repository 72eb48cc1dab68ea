// Shared constants for the telemetry generator, socket events, and client buffers.

pub const TELEMETRY_EVENT: &str = "rover:telemetry";
pub const COMMAND_EVENT: &str = "rover:command";
pub const SOCKET_PATH: &str = "/socket.io";

pub const BATTERY_CYCLE_MS: u64 = 100_000;
pub const BASE_LAT: f64 = 34.0522;
pub const BASE_LNG: f64 = -118.2437;
pub const POSITION_SWING_DEG: f64 = 0.001;
pub const MAX_SPEED_MPS: f64 = 5.0;
pub const AUTONOMOUS_CHANCE: f64 = 0.1;
pub const OBSTACLE_CHANCE: f64 = 0.05;
pub const OBSTACLE_DISTANCE_M: f64 = 1.2;
pub const OBSTACLE_ANGLE_DEG: f64 = 45.0;

/// An autonomous rover slower than this is planning rather than driving.
pub const PATH_PLANNING_SPEED_MPS: f64 = 1.0;

pub const DASHBOARD_FEED_CAP: usize = 50;
pub const TELEMETRY_HISTORY_CAP: usize = 100;
pub const MAP_TRACK_CAP: usize = 100;
pub const CALIBRATION_MS: u64 = 2_000;
pub const TOKEN_TTL_DAYS: u64 = 30;
