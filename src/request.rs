//! Request decoding and response envelope.
//!
//! The endpoint accepts a JSON body `{"query": "...", "variables": {...}}`
//! and always answers with a JSON `{"data"?, "errors"?}` envelope.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GatewayError, GraphqlError};

/// Decoded GraphQL request.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlRequest {
    /// Raw query text
    #[serde(default)]
    pub query: String,

    /// Variable bindings, empty when absent
    #[serde(default)]
    pub variables: HashMap<String, Value>,
}

impl GraphqlRequest {
    /// Decode the HTTP request body.
    ///
    /// A malformed body or a missing/empty query is fatal to the request and
    /// reported as `REQUEST_PARSE_ERROR`.
    pub fn decode(body: &[u8]) -> Result<Self, GatewayError> {
        let request: Self =
            serde_json::from_slice(body).map_err(|e| GatewayError::Parse(e.to_string()))?;
        if request.query.is_empty() {
            return Err(GatewayError::Parse("query is required".to_string()));
        }
        Ok(request)
    }

    /// Variables as the JSON object the execution engine expects.
    pub fn variables_json(&self) -> Value {
        Value::Object(
            self.variables
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// Response envelope serialized to the client.
///
/// `data` is omitted when absent and `errors` when empty, so a clean success
/// is `{"data": {...}}` and a pipeline failure is `{"errors": [...]}`.
#[derive(Debug, Default, Serialize)]
pub struct GraphqlResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
}

impl GraphqlResponse {
    /// Envelope carrying a single pipeline failure.
    pub fn from_error(error: GraphqlError) -> Self {
        Self {
            data: None,
            errors: vec![error],
        }
    }
}

impl From<async_graphql::Response> for GraphqlResponse {
    fn from(response: async_graphql::Response) -> Self {
        let errors = response.errors.into_iter().map(GraphqlError::from).collect();
        let data = match response.data.into_json() {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(_) => None,
        };
        Self { data, errors }
    }
}
