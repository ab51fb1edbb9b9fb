//! Relay error taxonomy.
//!
//! Every variant maps to exactly one localized error key, which is what the
//! client ends up seeing on its `error` channel.

use thiserror::Error;

use crate::i18n::{Language, Localizer};

/// Error key for an unreachable backend or a dial timeout.
pub const CONNECTION_ERROR: &str = "connectionError";
/// Error key for an undecodable backend payload.
pub const RESPONSE_ERROR: &str = "responseError";
/// Error key for an unexpected fault in the dispatch path.
pub const SERVER_ERROR: &str = "serverError";

/// Errors raised while relaying a query.
///
/// `Clone` so every caller joined on one connection attempt observes the
/// same outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    /// Backend unreachable, refused the dial, or the dial timed out.
    #[error("backend connection failed: {message}")]
    Connection {
        /// Transport detail.
        message: String,
    },
    /// The backend sent something that could not be decoded.
    #[error("undecodable backend payload: {message}")]
    Response {
        /// Decoder detail.
        message: String,
    },
    /// Unexpected fault while dispatching.
    #[error("relay fault: {message}")]
    Server {
        /// Description.
        message: String,
    },
}

impl RelayError {
    /// Build a [`RelayError::Connection`].
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Build a [`RelayError::Response`].
    pub fn response(message: impl Into<String>) -> Self {
        Self::Response {
            message: message.into(),
        }
    }

    /// Build a [`RelayError::Server`].
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    /// Catalog key of the client-facing message for this error.
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::Connection { .. } => CONNECTION_ERROR,
            Self::Response { .. } => RESPONSE_ERROR,
            Self::Server { .. } => SERVER_ERROR,
        }
    }

    /// Client-facing message in `language`.
    pub fn localized(&self, localizer: &dyn Localizer, language: Language) -> String {
        localizer.error_message(self.error_key(), language)
    }
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;

    #[test]
    fn keys_per_variant() {
        assert_eq!(RelayError::connection("x").error_key(), CONNECTION_ERROR);
        assert_eq!(RelayError::response("x").error_key(), RESPONSE_ERROR);
        assert_eq!(RelayError::server("x").error_key(), SERVER_ERROR);
    }

    #[test]
    fn display_includes_detail() {
        let err = RelayError::connection("timed out after 10s");
        assert_eq!(
            err.to_string(),
            "backend connection failed: timed out after 10s"
        );
    }

    #[test]
    fn localized_connection_error_english() {
        let catalog = Catalog::builtin();
        let msg = RelayError::connection("refused").localized(&catalog, Language::En);
        assert_eq!(msg, "Failed to connect to AI server.");
    }

    #[test]
    fn localized_response_error_hindi() {
        let catalog = Catalog::builtin();
        let msg = RelayError::response("bad json").localized(&catalog, Language::Hi);
        assert_eq!(msg, "AI उत्तर संसाधित करने में विफलता।");
    }

    #[test]
    fn clone_preserves_variant() {
        let err = RelayError::server("boom");
        assert_eq!(err.clone(), err);
    }
}
