//! Observability for the matchmaker
//!
//! Structured logs through `tracing`. Every request runs inside the span
//! opened by the HTTP trace layer, so handler and store logs carry the
//! request method and path.

mod logger;

pub use logger::{init_logging, LogFormat};
