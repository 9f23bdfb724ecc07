//! Handler capability trait and connection lifecycle.
//!
//! A [`GraphqlHandler`] bridges one backend gRPC service into the merged
//! schema. Implementations are emitted by the code generator; the gateway
//! only relies on the three capabilities below and never looks inside a
//! resolver.

use async_trait::async_trait;
use tonic::transport::Channel;

use crate::context::GatewayContext;
use crate::schema::FieldMap;

/// Release action run when a per-request connection is dropped.
pub type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Capability provider for one registered backend service.
#[async_trait]
pub trait GraphqlHandler: Send + Sync + 'static {
    /// Open a connection for this request.
    ///
    /// Called once per handler per request. A failure aborts the whole
    /// request with `GRPC_CONNECT_ERROR`.
    async fn connect(&self, ctx: &GatewayContext) -> anyhow::Result<Connection>;

    /// Named types referenced by this handler's fields (messages, enums,
    /// inputs). Registered into the schema alongside the root objects.
    fn types(&self) -> Vec<async_graphql::dynamic::Type> {
        Vec::new()
    }

    /// Query fields bound to the given channel.
    ///
    /// Called with `None` during registration-time validation; resolvers are
    /// never invoked in that mode.
    fn queries(&self, channel: Option<&Channel>) -> FieldMap;

    /// Mutation fields bound to the given channel.
    fn mutations(&self, channel: Option<&Channel>) -> FieldMap;
}

/// A connection yielded by [`GraphqlHandler::connect`].
pub struct Connection {
    channel: Channel,
    release: Option<ReleaseFn>,
}

impl Connection {
    /// Per-request connection; the release action runs when the request
    /// finishes, on every exit path.
    pub fn managed(channel: Channel, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            channel,
            release: Some(Box::new(release)),
        }
    }

    /// Pre-established connection owned by the caller; the gateway performs
    /// no per-request release.
    pub fn shared(channel: Channel) -> Self {
        Self {
            channel,
            release: None,
        }
    }

    pub(crate) fn into_parts(self) -> (Channel, ConnectionGuard) {
        (
            self.channel,
            ConnectionGuard {
                release: self.release,
            },
        )
    }
}

/// Scoped-acquisition guard.
///
/// Created the moment acquisition succeeds; runs the release action exactly
/// once when dropped, on success and on early-abort paths alike (including
/// unwinds).
pub(crate) struct ConnectionGuard {
    release: Option<ReleaseFn>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn lazy_channel() -> Channel {
        Channel::from_static("http://127.0.0.1:50051").connect_lazy()
    }

    #[tokio::test]
    async fn managed_guard_releases_exactly_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let conn = Connection::managed(lazy_channel(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let (_channel, guard) = conn.into_parts();
        drop(guard);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shared_connection_has_no_release() {
        let (_channel, guard) = Connection::shared(lazy_channel()).into_parts();
        drop(guard);
    }
}
