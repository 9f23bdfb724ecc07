//! Global middleware chain and per-field directive dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use http::request::Parts;

use crate::context::GatewayContext;
use crate::error::MiddlewareError;

/// Global request interceptor, run before any connection is opened.
///
/// Receives the current context and the raw request parts, and returns an
/// updated context or a failure. The first failure short-circuits the rest
/// of the chain and the whole handler set.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(
        &self,
        ctx: GatewayContext,
        request: &Parts,
    ) -> Result<GatewayContext, MiddlewareError>;
}

/// Per-field interceptor, keyed by (method name, directive name).
#[async_trait]
pub trait DirectiveMiddleware: Send + Sync {
    async fn handle(
        &self,
        ctx: &GatewayContext,
        request: &Parts,
        method: &str,
    ) -> Result<(), MiddlewareError>;
}

/// Ordered chain of global middleware, frozen at build time.
#[derive(Default)]
pub(crate) struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub(crate) fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Run all middleware in registration order, threading the context.
    pub(crate) async fn run(
        &self,
        mut ctx: GatewayContext,
        request: &Parts,
    ) -> Result<GatewayContext, MiddlewareError> {
        for middleware in &self.middlewares {
            ctx = middleware.handle(ctx, request).await?;
        }
        Ok(ctx)
    }
}

/// Directive middleware registry and dispatcher.
///
/// Dispatch is a textual heuristic: a directive fires when its method name
/// occurs as a literal substring of the raw query text. It can false-positive
/// (the name inside a string literal or an unrelated identifier) and
/// false-negative (a field reached through a fragment that never spells the
/// name). Kept as-is for compatibility with existing queries.
#[derive(Default)]
pub(crate) struct DirectiveRegistry {
    entries: HashMap<String, HashMap<String, Arc<dyn DirectiveMiddleware>>>,
}

impl DirectiveRegistry {
    pub(crate) fn register(
        &mut self,
        method: impl Into<String>,
        directive: impl Into<String>,
        middleware: Arc<dyn DirectiveMiddleware>,
    ) {
        self.entries
            .entry(method.into())
            .or_default()
            .insert(directive.into(), middleware);
    }

    /// Run every directive whose method name appears in the query text.
    ///
    /// Any failure aborts before execution.
    pub(crate) async fn dispatch(
        &self,
        ctx: &GatewayContext,
        request: &Parts,
        query: &str,
        method_names: &[String],
    ) -> Result<(), MiddlewareError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        for method in method_names {
            if !query.contains(method.as_str()) {
                continue;
            }
            if let Some(directives) = self.entries.get(method) {
                for middleware in directives.values() {
                    middleware.handle(ctx, request, method).await?;
                }
            }
        }
        Ok(())
    }
}
