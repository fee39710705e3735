//! Accept loop feeding new clients to admission.

use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use log::warn;
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    time::{Duration, sleep},
};

use super::backoff::BackoffConfig;
use crate::{
    evaluator::Evaluator,
    server::{ServerContext, connection::dispatch},
};

/// Abstraction for sources of incoming connections consumed by the accept loop.
///
/// Implementations must be cancellation-safe: dropping a pending `accept()`
/// future must not leak resources.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub(in crate::server) trait AcceptListener: Send + Sync {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl AcceptListener for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { TcpListener::local_addr(self) }
}

/// Accept connections from `listener` until the server shuts down.
///
/// Each accepted client goes through admission before the next `accept()`,
/// so admission decisions are made in arrival order. Accept failures are
/// logged and retried after an exponential back-off governed by `backoff`;
/// the delay resets after the next successful accept.
pub(in crate::server) async fn accept_loop<L, E>(
    listener: Arc<L>,
    ctx: Arc<ServerContext<E>>,
    backoff: BackoffConfig,
) where
    L: AcceptListener + 'static,
    E: Evaluator,
{
    let backoff = backoff.normalized();
    debug_assert!(
        backoff.initial_delay <= backoff.max_delay,
        "BackoffConfig invariant violated: initial_delay > max_delay"
    );
    let mut delay = backoff.initial_delay;
    while let Some(next_delay) = accept_iteration(listener.as_ref(), &ctx, &backoff, delay).await {
        delay = next_delay;
    }
}

async fn accept_iteration<L, E>(
    listener: &L,
    ctx: &ServerContext<E>,
    backoff: &BackoffConfig,
    delay: Duration,
) -> Option<Duration>
where
    L: AcceptListener,
    E: Evaluator,
{
    select! {
        biased;

        () = ctx.shutdown.cancelled() => None,
        res = listener.accept() => match res {
            Ok((stream, peer_addr)) => {
                // Admission may wait for the mailbox slot; shutdown wakes it.
                dispatch(stream, peer_addr, ctx).await;
                Some(backoff.initial_delay)
            }
            Err(e) => {
                let local_addr = listener.local_addr().ok();
                warn!("accept error: error={e:?}, local_addr={local_addr:?}");
                crate::metrics::inc_errors();
                select! {
                    biased;

                    () = ctx.shutdown.cancelled() => None,
                    () = sleep(delay) => Some((delay * 2).min(backoff.max_delay)),
                }
            }
        },
    }
}
