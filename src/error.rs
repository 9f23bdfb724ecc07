//! Error types for the gateway runtime.
//!
//! Every failure a client can observe is reported as a [`GraphqlError`]
//! envelope inside the response body. Pipeline failures (parse, middleware,
//! connection, schema, directive) are modeled by [`GatewayError`] and
//! translated into exactly one envelope entry; business errors raised by
//! resolvers are translated from the execution engine's error type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Error envelope exposed to clients.
///
/// Serialized shape: `{"message": "...", "extensions": {"code": "..."}}`.
/// Extensions are omitted when empty (business errors may carry none).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlError {
    /// Human-readable error message
    pub message: String,
    /// Machine-readable metadata, at least a "code" key for pipeline errors
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl GraphqlError {
    /// Create an envelope carrying an error code.
    pub fn coded(code: impl Into<String>, message: impl Into<String>) -> Self {
        let mut extensions = Map::new();
        extensions.insert("code".to_string(), Value::String(code.into()));
        Self {
            message: message.into(),
            extensions,
        }
    }

    /// The "code" extension, if present.
    pub fn code(&self) -> Option<&str> {
        self.extensions.get("code").and_then(Value::as_str)
    }
}

impl From<async_graphql::ServerError> for GraphqlError {
    fn from(err: async_graphql::ServerError) -> Self {
        let extensions = err
            .extensions
            .as_ref()
            .and_then(|ext| serde_json::to_value(ext).ok())
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();
        Self {
            message: err.message,
            extensions,
        }
    }
}

/// Failure raised by a global or directive middleware.
///
/// A `Coded` failure carries an explicit code and message that pass through
/// to the envelope verbatim; any other failure is wrapped with the generic
/// code of the stage that ran it (`MIDDLEWARE_ERROR` or
/// `DIRECTIVE_MIDDLEWARE_ERROR`).
#[derive(Debug, Error)]
pub enum MiddlewareError {
    #[error("{message}")]
    Coded { code: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MiddlewareError {
    /// Create a typed failure with an explicit code.
    pub fn coded(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Coded {
            code: code.into(),
            message: message.into(),
        }
    }

    fn into_envelope(self, fallback_code: &str) -> GraphqlError {
        match self {
            Self::Coded { code, message } => GraphqlError::coded(code, message),
            Self::Other(err) => GraphqlError::coded(fallback_code, err.to_string()),
        }
    }
}

/// Pipeline-level failures, each fatal to the whole request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Failed to parse request: {0}")]
    Parse(String),

    #[error("{0}")]
    Middleware(MiddlewareError),

    #[error("Failed to create grpc connection: {0}")]
    Connect(anyhow::Error),

    #[error("Failed to build schema: {0}")]
    Schema(String),

    #[error("{0}")]
    Directive(MiddlewareError),
}

impl GatewayError {
    /// Translate into the single envelope entry reported to the client.
    pub fn into_envelope(self) -> GraphqlError {
        let message = self.to_string();
        match self {
            Self::Parse(_) => GraphqlError::coded("REQUEST_PARSE_ERROR", message),
            Self::Connect(_) => GraphqlError::coded("GRPC_CONNECT_ERROR", message),
            Self::Schema(_) => GraphqlError::coded("SCHEMA_GENERATION_ERROR", message),
            Self::Middleware(err) => err.into_envelope("MIDDLEWARE_ERROR"),
            Self::Directive(err) => err.into_envelope("DIRECTIVE_MIDDLEWARE_ERROR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coded_envelope_has_code_extension() {
        let err = GraphqlError::coded("UNAUTHORIZED", "no token");
        assert_eq!(err.code(), Some("UNAUTHORIZED"));
        assert_eq!(err.message, "no token");
    }

    #[test]
    fn typed_middleware_error_passes_through() {
        let err = GatewayError::Middleware(MiddlewareError::coded("UNAUTHORIZED", "no token"));
        let envelope = err.into_envelope();
        assert_eq!(envelope.code(), Some("UNAUTHORIZED"));
        assert_eq!(envelope.message, "no token");
    }

    #[test]
    fn untyped_middleware_error_gets_generic_code() {
        let err = GatewayError::Middleware(anyhow::anyhow!("boom").into());
        let envelope = err.into_envelope();
        assert_eq!(envelope.code(), Some("MIDDLEWARE_ERROR"));
        assert_eq!(envelope.message, "boom");
    }

    #[test]
    fn connect_error_keeps_underlying_message() {
        let err = GatewayError::Connect(anyhow::anyhow!("dial refused"));
        let envelope = err.into_envelope();
        assert_eq!(envelope.code(), Some("GRPC_CONNECT_ERROR"));
        assert!(envelope.message.contains("dial refused"));
    }

    #[test]
    fn extensions_omitted_from_json_when_empty() {
        let err = GraphqlError {
            message: "plain".to_string(),
            extensions: Map::new(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("extensions").is_none());
    }
}
