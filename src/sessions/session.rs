//! Session record and its hash encoding

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{SessionError, SessionResult};

/// Prefix of every session key in the store
pub const SESSION_KEY_PREFIX: &str = "Session:";

/// Lifetime of a stored session, reset on every write
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// Store key for the session `id`
pub fn session_key(id: &str) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, id)
}

/// A game session: an id plus the endpoint allocated for it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,

    /// Game server port, 0 when unset
    #[serde(default, skip_serializing_if = "is_zero")]
    pub port: u16,

    /// Game server address, empty when unset
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ip: String,
}

fn is_zero(port: &u16) -> bool {
    *port == 0
}

impl Session {
    pub fn new(id: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            port,
            ip: ip.into(),
        }
    }

    /// Store key for this session
    pub fn key(&self) -> String {
        session_key(&self.id)
    }

    /// Reject records that cannot be stored
    pub fn validate(&self) -> SessionResult<()> {
        if self.id.is_empty() {
            return Err(SessionError::invalid("session id must not be empty"));
        }
        Ok(())
    }

    /// Hash fields written for this session
    pub(crate) fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            ("id".to_string(), self.id.clone()),
            ("port".to_string(), self.port.to_string()),
            ("ip".to_string(), self.ip.clone()),
        ]
    }

    /// Decode a session from its hash fields.
    ///
    /// Unknown fields are ignored and missing ones keep their zero value.
    pub(crate) fn from_fields(fields: &HashMap<String, String>) -> SessionResult<Self> {
        let mut session = Session::default();
        for (name, value) in fields {
            match name.as_str() {
                "id" => session.id = value.clone(),
                "ip" => session.ip = value.clone(),
                "port" if value.is_empty() => session.port = 0,
                "port" => {
                    session.port = value.parse().map_err(|e| {
                        SessionError::storage(format!("invalid port {:?}: {}", value, e))
                    })?;
                }
                _ => {}
            }
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_key_derivation() {
        assert_eq!(session_key("abc123"), "Session:abc123");
        assert_eq!(Session::new("x", "", 0).key(), "Session:x");
    }

    #[test]
    fn test_json_omits_unset_fields() {
        let json = serde_json::to_string(&Session::new("abc", "", 0)).unwrap();
        assert_eq!(json, r#"{"id":"abc"}"#);

        let json = serde_json::to_string(&Session::new("abc", "10.0.0.5", 7777)).unwrap();
        assert_eq!(json, r#"{"id":"abc","port":7777,"ip":"10.0.0.5"}"#);
    }

    #[test]
    fn test_json_defaults_missing_fields() {
        let session: Session = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(session, Session::new("abc", "", 0));
    }

    #[test]
    fn test_empty_id_is_invalid() {
        let err = Session::default().validate().unwrap_err();
        assert!(err.is_invalid());
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let session =
            Session::from_fields(&fields(&[("id", "a"), ("port", "80"), ("extra", "x")])).unwrap();
        assert_eq!(session, Session::new("a", "", 80));
    }

    #[test]
    fn test_decode_bad_port_is_storage_error() {
        let err = Session::from_fields(&fields(&[("id", "a"), ("port", "http")])).unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn test_fields_cover_every_attribute() {
        let session = Session::new("a", "10.0.0.1", 9000);
        let map: HashMap<String, String> = session.to_fields().into_iter().collect();
        assert_eq!(Session::from_fields(&map).unwrap(), session);
    }
}
