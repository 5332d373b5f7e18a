//! matchmaker - game session registry for the matchmaking service
//!
//! Sessions (an id plus the ip/port of an allocated game server) are kept in
//! a key-value store with a one hour lifetime and exposed over HTTP.

pub mod cli;
pub mod http_server;
pub mod observability;
pub mod sessions;
pub mod store;

/// Version string reported in logs and by `/health`
pub const VERSION: &str = concat!("matchmaker:", env!("CARGO_PKG_VERSION"));
