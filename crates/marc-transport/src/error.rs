//! Transport errors.
//!
//! Engine operations never fail for business reasons; these cover only
//! malformed requests and lookups that a client must branch on.

use thiserror::Error;

/// Request-level error, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Missing {0}")]
    Missing(&'static str),
    #[error("Unknown session: {0}")]
    UnknownSession(String),
}

impl TransportError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Missing(_) => 400,
            Self::UnknownSession(_) => 404,
        }
    }
}

/// Take a required body field, treating empty strings as absent.
///
/// # Errors
/// Returns `Missing(what)` if the field is absent or empty.
pub fn required(value: Option<String>, what: &'static str) -> Result<String, TransportError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(TransportError::Missing(what))
}

#[cfg(feature = "http")]
impl axum::response::IntoResponse for TransportError {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.status_code())
            .unwrap_or(axum::http::StatusCode::BAD_REQUEST);
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_count_as_missing() {
        assert!(matches!(
            required(Some(String::new()), "name"),
            Err(TransportError::Missing("name"))
        ));
        assert!(matches!(required(None, "target"), Err(TransportError::Missing("target"))));
        assert_eq!(required(Some("bob".into()), "name").unwrap(), "bob");
    }

    #[test]
    fn status_codes() {
        assert_eq!(TransportError::Missing("x").status_code(), 400);
        assert_eq!(TransportError::UnknownSession("abc".into()).status_code(), 404);
    }
}
