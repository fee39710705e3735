//! Admission of freshly accepted connections.

use std::net::SocketAddr;

use log::{debug, info, warn};
use tokio::{io::AsyncWriteExt, net::TcpStream};

use super::{ServerContext, gate::AdmissionPermit};
use crate::{
    evaluator::Evaluator,
    protocol::{HANDSHAKE, OVERLOAD_NOTICE},
};

/// A client that passed admission and is waiting for, or owned by, a worker.
///
/// The permit travels with the stream, so whoever drops the connection also
/// returns its admission slot.
#[derive(Debug)]
pub(crate) struct AdmittedConnection {
    pub(crate) stream: TcpStream,
    pub(crate) peer_addr: SocketAddr,
    pub(crate) permit: AdmissionPermit,
}

/// Admit `stream` if capacity allows and hand it to the worker pool.
///
/// Clients beyond capacity get [`OVERLOAD_NOTICE`] and are closed without
/// touching the mailbox. Admitted clients receive the handshake byte first;
/// if that write fails the client is dropped and its permit released.
pub(super) async fn dispatch<E: Evaluator>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    ctx: &ServerContext<E>,
) {
    let Some(permit) = ctx.gate.try_acquire() else {
        reject(stream, peer_addr).await;
        return;
    };
    info!(
        "client admitted: peer_addr={peer_addr}, in_service={}",
        ctx.gate.in_service()
    );

    if let Err(e) = stream.write_all(&[HANDSHAKE]).await {
        warn!("handshake failed, dropping client: peer_addr={peer_addr}, error={e}");
        crate::metrics::inc_errors();
        return;
    }

    let connection = AdmittedConnection {
        stream,
        peer_addr,
        permit,
    };
    if ctx.mailbox.publish(connection).await.is_err() {
        debug!("server shutting down, dropping admitted client: peer_addr={peer_addr}");
    }
}

async fn reject(mut stream: TcpStream, peer_addr: SocketAddr) {
    info!("max connections reached, rejecting client: peer_addr={peer_addr}");
    crate::metrics::inc_rejected();
    if let Err(e) = stream.write_all(OVERLOAD_NOTICE.as_bytes()).await {
        debug!("failed to notify rejected client: peer_addr={peer_addr}, error={e}");
    }
}
