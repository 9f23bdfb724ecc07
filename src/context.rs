//! Per-request context threaded from middleware into resolvers.

use http::Extensions;

/// Typed value map created per request.
///
/// Global middleware may insert values (an authenticated principal, a tenant
/// id) and return the updated context; the gateway attaches the final
/// context to execution as request data, so resolvers read it back with
/// `ctx.data::<GatewayContext>()`.
#[derive(Debug, Default, Clone)]
pub struct GatewayContext {
    values: Extensions,
}

impl GatewayContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value of the same type.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.values.insert(value);
    }

    /// Get a value by type.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }
}
