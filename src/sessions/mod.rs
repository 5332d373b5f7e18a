//! # Game Sessions
//!
//! Session records and their persistence in the store.
//!
//! A session is written as one hash under `Session:<id>` together with its
//! expiry in a single transaction, so readers never see a half-written
//! record. Reads of missing or expired keys report [`SessionErrorKind::NotFound`].

mod errors;
mod repository;
mod session;

pub use errors::{ResultExt, SessionError, SessionErrorKind, SessionResult};
pub use repository::SessionRepository;
pub use session::{session_key, Session, SESSION_KEY_PREFIX, SESSION_TTL};
