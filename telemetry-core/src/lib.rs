// Shared rover telemetry models, generator, and client-side state.

pub mod buffers;
pub mod constants;
pub mod generator;
pub mod model;
pub mod protocol;
pub mod session;
pub mod sink;

pub use model::{CommandKind, RoverCommand, TelemetrySnapshot};
pub use protocol::SocketEvent;
pub use sink::TelemetrySink;
