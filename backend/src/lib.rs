// Crate root for the rover command server and its native client.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod tasks;
pub mod users;
pub mod utils;
pub mod ws;
