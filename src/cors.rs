//! Cross-origin policy for the endpoint.

use http::{HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

/// Cross-origin settings applied to the endpoint when configured.
///
/// A `"*"` entry in any list means "allow any". Defaults allow everything,
/// which suits a gateway sitting behind an ingress; tighten for direct
/// browser exposure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the endpoint
    pub allowed_origins: Vec<String>,

    /// HTTP methods allowed in preflight
    pub allowed_methods: Vec<String>,

    /// Request headers allowed in preflight
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["*".to_string()],
            allowed_headers: vec!["*".to_string()],
        }
    }
}

/// Build a CORS layer from config.
pub(crate) fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    if config.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();
        layer = layer.allow_origin(origins);
    }

    if config.allowed_methods.iter().any(|m| m == "*") {
        layer = layer.allow_methods(Any);
    } else {
        let methods: Vec<Method> = config
            .allowed_methods
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        layer = layer.allow_methods(methods);
    }

    if config.allowed_headers.iter().any(|h| h == "*") {
        layer = layer.allow_headers(Any);
    } else {
        let headers: Vec<HeaderName> = config
            .allowed_headers
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        layer = layer.allow_headers(headers);
    }

    layer
}
