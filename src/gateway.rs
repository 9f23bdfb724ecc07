//! Gateway builder and request runtime.
//!
//! [`GatewayBuilder`] accumulates handlers, middleware, and directives during
//! setup, then freezes into an immutable [`Gateway`]. Nothing on the request
//! path mutates shared state, so no lock is taken anywhere.
//!
//! Per request: decode body, run the middleware chain, open one connection
//! per handler, merge field maps, assemble the schema, dispatch matching
//! directives, execute, respond. Every opened connection is released before
//! the response leaves, whatever the outcome.

use std::sync::Arc;

use async_graphql::Variables;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::any;
use axum::{Json, Router};
use http::request::Parts;

use crate::config::GatewayConfig;
use crate::context::GatewayContext;
use crate::cors::{build_cors_layer, CorsConfig};
use crate::error::{GatewayError, GraphqlError};
use crate::handler::GraphqlHandler;
use crate::middleware::{DirectiveMiddleware, DirectiveRegistry, Middleware, MiddlewareChain};
use crate::request::{GraphqlRequest, GraphqlResponse};
use crate::schema::{self, FieldMap};

/// Observer invoked with the business errors of a request, if any.
pub type ErrorObserver = dyn Fn(&[GraphqlError]) + Send + Sync;

const DEFAULT_ENDPOINT: &str = "/graphql";

/// Accumulates configuration during setup; [`build`](Self::build) freezes it.
#[derive(Default)]
pub struct GatewayBuilder {
    handlers: Vec<Arc<dyn GraphqlHandler>>,
    middlewares: MiddlewareChain,
    directives: DirectiveRegistry,
    endpoint: Option<String>,
    cors: Option<CorsConfig>,
    observer: Option<Arc<ErrorObserver>>,
}

impl GatewayBuilder {
    /// Register a handler built by the code generator.
    ///
    /// The handler's field definitions are validated immediately by building
    /// a throwaway schema with no connection, so malformed definitions fail
    /// setup instead of the first request. A handler with no fields at all
    /// skips validation.
    pub fn register(mut self, handler: impl GraphqlHandler) -> Result<Self, GatewayError> {
        let handler: Arc<dyn GraphqlHandler> = Arc::new(handler);
        validate_handler(handler.as_ref())?;
        self.handlers.push(handler);
        Ok(self)
    }

    /// Append a global middleware; the chain runs in registration order.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Register a directive middleware for a method name.
    pub fn directive(
        mut self,
        method: impl Into<String>,
        directive: impl Into<String>,
        middleware: impl DirectiveMiddleware + 'static,
    ) -> Self {
        self.directives
            .register(method, directive, Arc::new(middleware));
        self
    }

    /// Mount the endpoint at a custom path (default `/graphql`).
    pub fn endpoint(mut self, path: impl Into<String>) -> Self {
        self.endpoint = Some(path.into());
        self
    }

    /// Attach a cross-origin policy to the endpoint.
    pub fn cors(mut self, config: CorsConfig) -> Self {
        self.cors = Some(config);
        self
    }

    /// Observe business errors (logging, metrics). Side-effect only; cannot
    /// alter the response.
    pub fn on_errors(mut self, observer: impl Fn(&[GraphqlError]) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Freeze into an immutable gateway.
    pub fn build(self) -> Gateway {
        Gateway {
            handlers: self.handlers,
            middlewares: self.middlewares,
            directives: self.directives,
            endpoint: self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            cors: self.cors,
            observer: self.observer,
        }
    }
}

/// Validate a handler's field definitions with no connection.
fn validate_handler(handler: &dyn GraphqlHandler) -> Result<(), GatewayError> {
    let queries = handler.queries(None);
    let mutations = handler.mutations(None);
    if queries.is_empty() && mutations.is_empty() {
        return Ok(());
    }
    schema::assemble(handler.types(), queries, mutations).map(|_| ())
}

/// Frozen gateway runtime serving one GraphQL endpoint.
pub struct Gateway {
    handlers: Vec<Arc<dyn GraphqlHandler>>,
    middlewares: MiddlewareChain,
    directives: DirectiveRegistry,
    endpoint: String,
    cors: Option<CorsConfig>,
    observer: Option<Arc<ErrorObserver>>,
}

impl Gateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Run one request through the full pipeline.
    ///
    /// Never fails at the transport level: every outcome is an envelope.
    pub async fn handle(&self, parts: &Parts, body: &[u8]) -> GraphqlResponse {
        match self.run(parts, body).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("graphql request failed: {}", err);
                GraphqlResponse::from_error(err.into_envelope())
            }
        }
    }

    async fn run(&self, parts: &Parts, body: &[u8]) -> Result<GraphqlResponse, GatewayError> {
        let request = GraphqlRequest::decode(body)?;

        let ctx = self
            .middlewares
            .run(GatewayContext::new(), parts)
            .await
            .map_err(GatewayError::Middleware)?;

        // Open one connection per handler. Each guard is armed the moment
        // acquisition succeeds, so earlier handlers release even when a later
        // one fails.
        let mut guards = Vec::with_capacity(self.handlers.len());
        let mut types = Vec::new();
        let mut queries = FieldMap::new();
        let mut mutations = FieldMap::new();
        for handler in &self.handlers {
            let connection = handler
                .connect(&ctx)
                .await
                .map_err(GatewayError::Connect)?;
            let (channel, guard) = connection.into_parts();
            guards.push(guard);

            types.extend(handler.types());
            queries.merge(handler.queries(Some(&channel)));
            mutations.merge(handler.mutations(Some(&channel)));
        }

        let method_names: Vec<String> = queries
            .names()
            .chain(mutations.names())
            .map(str::to_string)
            .collect();

        let schema = schema::assemble(types, queries, mutations)?;

        self.directives
            .dispatch(&ctx, parts, &request.query, &method_names)
            .await
            .map_err(GatewayError::Directive)?;

        tracing::debug!(methods = method_names.len(), "executing graphql request");
        let execution = async_graphql::Request::new(request.query.as_str())
            .variables(Variables::from_json(request.variables_json()))
            .data(ctx);
        let result = schema.execute(execution).await;

        let response = GraphqlResponse::from(result);
        if !response.errors.is_empty() {
            match &self.observer {
                Some(observer) => observer(&response.errors),
                None => default_error_observer(&response.errors),
            }
        }
        Ok(response)
        // guards drop here: every per-request connection is released before
        // the response is written
    }

    /// Mount the endpoint on an axum router, with the CORS layer when
    /// configured.
    pub fn into_router(self) -> Router {
        let cors = self.cors.as_ref().map(build_cors_layer);
        let endpoint = self.endpoint.clone();
        let gateway = Arc::new(self);
        let mut router = Router::new()
            .route(&endpoint, any(graphql_endpoint))
            .with_state(gateway);
        if let Some(cors) = cors {
            router = router.layer(cors);
        }
        router
    }

    /// Bind a TCP listener and serve until the process stops.
    pub async fn serve(self, config: &GatewayConfig) -> anyhow::Result<()> {
        let addr = config.listen_addr.clone();
        let version = config.version.clone();
        let router = self.into_router();

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("GraphQL gateway v{} listening on {}", version, addr);
        axum::serve(listener, router).await?;
        Ok(())
    }
}

fn default_error_observer(errors: &[GraphqlError]) {
    for err in errors {
        tracing::error!("graphql error: {}", err.message);
    }
}

/// Axum handler for the endpoint. Always responds 200; errors are data.
async fn graphql_endpoint(
    State(gateway): State<Arc<Gateway>>,
    request: axum::extract::Request,
) -> impl IntoResponse {
    let (parts, body) = request.into_parts();
    let response = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => gateway.handle(&parts, &bytes).await,
        Err(err) => {
            GraphqlResponse::from_error(GatewayError::Parse(err.to_string()).into_envelope())
        }
    };
    (StatusCode::OK, Json(response))
}
