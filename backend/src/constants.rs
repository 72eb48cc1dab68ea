// Shared constants for server defaults, auth messages, and client retry policy.

pub const SYSTEM_NAME: &str = "Rover Command Center API";
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_JWT_SECRET: &str = "secret";
pub const TELEMETRY_INTERVAL_MS: u64 = 1_000;
pub const MAX_TOKEN_TTL_DAYS: u64 = 3_650;
pub const MONGO_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const MONGO_DEFAULT_DATABASE: &str = "rover";
pub const EMITTER_CHANNEL_CAP: usize = 16;

pub const MSG_USER_EXISTS: &str = "User already exists";
pub const MSG_INVALID_USER_DATA: &str = "Invalid user data";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const MSG_NOT_AUTHORIZED: &str = "Not authorized, token failed";
pub const MSG_FORBIDDEN: &str = "Insufficient clearance level";
pub const MSG_SERVER_ERROR: &str = "Server error";

pub const RECONNECT_ATTEMPTS: u32 = 5;
pub const RECONNECT_DELAY_MS: u64 = 1_000;
pub const CLIENT_TIMEOUT_SECS: u64 = 10;
