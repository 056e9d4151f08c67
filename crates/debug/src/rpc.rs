// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-level bindings of the debug-lock context.
//!
//! The generic RPC machinery lives outside this crate; what lives here is
//! the binding of one endpoint — `lock_tty_for_child` — onto any ordered
//! byte stream: the client side opens the context and drives the session,
//! the server side frames a [`ServerCtx`] over the stream and invokes the
//! lease task. The transport only has to deliver bytes in order.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use troupe_core::ActorId;
use troupe_wire::{
    read_frame, write_frame, ContextFrame, LeaseOutcome, LockStatus, ReplMsg, LOCK_TTY_ENDPOINT,
};

use crate::error::RpcError;
use crate::lease::lock_tty_for_child;
use crate::runtime::{ActorRuntime, LeaseChannel, ServerCtx};

/// Client side of a lease context over a framed byte stream.
pub struct FramedLeaseChannel<S> {
    io: S,
}

/// Open a `lock_tty_for_child` context over `io` and wait for the started
/// handshake.
pub async fn open_lock_context<S>(
    mut io: S,
    subactor_uid: ActorId,
) -> Result<(LockStatus, FramedLeaseChannel<S>), RpcError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let open =
        ContextFrame::Open { endpoint: LOCK_TTY_ENDPOINT.to_string(), subactor_uid };
    write_frame(&mut io, &open).await?;

    match read_frame(&mut io).await {
        Ok(ContextFrame::Started { value }) => Ok((value, FramedLeaseChannel { io })),
        Ok(ContextFrame::Cancelled { reason, enter_debugger }) => {
            Err(RpcError::ContextCancelled { reason, enter_debugger })
        }
        Ok(frame) => Err(RpcError::Protocol(format!("expected started, got {}", frame.kind()))),
        Err(troupe_wire::WireError::ConnectionClosed) => Err(RpcError::Closed),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl<S> LeaseChannel for FramedLeaseChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, msg: ReplMsg) -> Result<(), RpcError> {
        write_frame(&mut self.io, &ContextFrame::Stream { msg }).await?;
        Ok(())
    }

    async fn result(&mut self) -> Result<LeaseOutcome, RpcError> {
        match read_frame(&mut self.io).await {
            Ok(ContextFrame::Result { value }) => Ok(value),
            Ok(ContextFrame::Cancelled { reason, enter_debugger }) => {
                Err(RpcError::ContextCancelled { reason, enter_debugger })
            }
            Ok(frame) => {
                Err(RpcError::Protocol(format!("expected result, got {}", frame.kind())))
            }
            Err(troupe_wire::WireError::ConnectionClosed) => Err(RpcError::Closed),
            Err(e) => Err(e.into()),
        }
    }
}

/// Server side of a lease context over a framed byte stream.
pub struct FramedServerCtx<S> {
    reader: ReadHalf<S>,
    writer: WriteHalf<S>,
    /// Fired by the transport when the peer's channel dies.
    peer_lost: CancellationToken,
    cancelled: bool,
    enter_debugger_on_cancel: bool,
}

#[async_trait]
impl<S> ServerCtx for FramedServerCtx<S>
where
    S: AsyncRead + AsyncWrite + Send,
{
    async fn started(&mut self, status: LockStatus) -> Result<(), RpcError> {
        write_frame(&mut self.writer, &ContextFrame::Started { value: status }).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<ReplMsg, RpcError> {
        let peer_lost = self.peer_lost.clone();
        let frame = tokio::select! {
            frame = read_frame(&mut self.reader) => frame,
            () = peer_lost.cancelled() => return Err(RpcError::PeerLost),
        };
        match frame {
            Ok(ContextFrame::Stream { msg }) => Ok(msg),
            Ok(frame) => {
                Err(RpcError::Protocol(format!("expected stream msg, got {}", frame.kind())))
            }
            Err(troupe_wire::WireError::ConnectionClosed) => Err(RpcError::PeerLost),
            Err(e) => Err(e.into()),
        }
    }

    async fn cancel(&mut self, reason: &str) -> Result<(), RpcError> {
        self.cancelled = true;
        let frame = ContextFrame::Cancelled {
            reason: reason.to_string(),
            enter_debugger: self.enter_debugger_on_cancel,
        };
        write_frame(&mut self.writer, &frame).await?;
        Ok(())
    }

    fn set_enter_debugger_on_cancel(&mut self, enabled: bool) {
        self.enter_debugger_on_cancel = enabled;
    }
}

/// Serve one `lock_tty_for_child` context over `io`.
///
/// Reads the open frame, invokes the lease task, and delivers its result —
/// or a cancellation carrying the failure reason — back to the caller.
/// `peer_lost` is the transport's peer-loss signal for this channel.
pub async fn serve_lock_context<S>(
    actor: Arc<dyn ActorRuntime>,
    io: S,
    peer_lost: CancellationToken,
) -> Result<(), RpcError>
where
    S: AsyncRead + AsyncWrite + Send,
{
    let (reader, writer) = tokio::io::split(io);
    let mut ctx = FramedServerCtx {
        reader,
        writer,
        peer_lost: peer_lost.clone(),
        cancelled: false,
        enter_debugger_on_cancel: true,
    };

    let open = tokio::select! {
        frame = read_frame(&mut ctx.reader) => frame?,
        () = peer_lost.cancelled() => return Err(RpcError::PeerLost),
    };
    let subactor_uid = match open {
        ContextFrame::Open { endpoint, subactor_uid } if endpoint == LOCK_TTY_ENDPOINT => {
            subactor_uid
        }
        ContextFrame::Open { endpoint, .. } => {
            return Err(RpcError::Protocol(format!("unknown endpoint: {endpoint}")));
        }
        frame => {
            return Err(RpcError::Protocol(format!("expected open, got {}", frame.kind())));
        }
    };

    match lock_tty_for_child(&actor, &mut ctx, subactor_uid).await {
        Ok(outcome) => {
            if !ctx.cancelled {
                write_frame(&mut ctx.writer, &ContextFrame::Result { value: outcome }).await?;
            }
            Ok(())
        }
        Err(e) => {
            debug!(error = %e, "lease task failed; cancelling context");
            if !ctx.cancelled {
                let frame = ContextFrame::Cancelled {
                    reason: e.to_string(),
                    enter_debugger: ctx.enter_debugger_on_cancel,
                };
                // the peer may already be gone; the lease released either way
                let _ = write_frame(&mut ctx.writer, &frame).await;
            }
            Ok(())
        }
    }
}
