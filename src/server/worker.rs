//! Worker tasks serving admitted connections.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use log::{debug, error, info};

use super::{ServerContext, connection::AdmittedConnection};
use crate::{evaluator::Evaluator, panic::format_panic, session};

/// Serve connections from the mailbox until the server shuts down.
///
/// A worker owns one connection at a time and only asks for the next one
/// after the previous session has ended and its permit has been released.
pub(super) async fn worker_loop<E: Evaluator>(id: usize, ctx: Arc<ServerContext<E>>) {
    debug!("worker started: worker={id}");
    while let Some(connection) = ctx.mailbox.take().await {
        serve_connection(id, connection, &ctx).await;
    }
    debug!("worker stopped: worker={id}");
}

async fn serve_connection<E: Evaluator>(
    id: usize,
    connection: AdmittedConnection,
    ctx: &ServerContext<E>,
) {
    let AdmittedConnection {
        mut stream,
        peer_addr,
        permit,
    } = connection;
    info!("serving client: worker={id}, peer_addr={peer_addr}");

    let session = session::serve(&mut stream, &ctx.evaluator, &ctx.shutdown);
    match AssertUnwindSafe(session).catch_unwind().await {
        Ok(end) => info!("client session ended: worker={id}, peer_addr={peer_addr}, reason={end}"),
        Err(panic) => {
            crate::metrics::inc_worker_panics();
            let panic_msg = format_panic(panic);
            // Emit via both `log` and `tracing` for tests that capture either.
            error!("client session panicked: worker={id}, panic={panic_msg}, peer_addr={peer_addr}");
            tracing::error!(worker = id, panic = %panic_msg, %peer_addr, "client session panicked");
        }
    }

    drop(stream);
    drop(permit);
}
