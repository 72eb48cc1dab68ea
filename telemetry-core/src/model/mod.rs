// Wire models for telemetry, commands, and accounts.

mod command;
mod snapshot;
mod user;

pub use command::{CommandKind, RoverCommand};
pub use snapshot::{Coordinates, LinkStatus, Obstacle, Orientation, RoverMode, TelemetrySnapshot};
pub use user::{AuthResponse, ErrorMessage, Role};
