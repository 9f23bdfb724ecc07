//! GraphQL gateway runtime for gRPC services.
//!
//! Composes one queryable schema from independently generated per-service
//! handlers and serves it on a single HTTP endpoint. Resolvers proxy to
//! remote procedure calls over tonic channels; failures of any kind are
//! reported inside the response body, never as transport errors.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use graphql_gateway::{Gateway, GatewayConfig};
//!
//! let gateway = Gateway::builder()
//!     .register(GreeterHandler::new(None))?
//!     .build();
//! gateway.serve(&GatewayConfig::from_env()).await?;
//! ```

pub mod config;
pub mod context;
pub mod cors;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod schema;

pub use config::GatewayConfig;
pub use context::GatewayContext;
pub use cors::CorsConfig;
pub use error::{GatewayError, GraphqlError, MiddlewareError};
pub use gateway::{Gateway, GatewayBuilder};
pub use handler::{Connection, GraphqlHandler, ReleaseFn};
pub use middleware::{DirectiveMiddleware, Middleware};
pub use request::{GraphqlRequest, GraphqlResponse};
pub use schema::FieldMap;
