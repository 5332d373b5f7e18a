//! # Matchmaker HTTP Server Module
//!
//! HTTP gateway in front of the session store.
//!
//! # Endpoints
//!
//! - `POST /game` - Create or overwrite a session
//! - `GET /game/:id` - Fetch a session
//! - `GET /readiness` - Store liveness probe
//! - `GET /health` - Process health check

pub mod config;
pub mod errors;
pub mod game_routes;
pub mod health_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ServerError};
pub use server::{build_router, GameServer, ServerState};
