//! Inbound control channel
//!
//! A tokio task owns the UDP socket, decodes each datagram and forwards the
//! messages over an unbounded channel. The sync loop drains that channel with
//! `try_recv` once per tick, so it never waits for the network.

use std::collections::VecDeque;
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tokio::task::JoinHandle;

use super::osc::decode_packet;
use crate::control::ControlMessage;

/// Default control port
pub const DEFAULT_CONTROL_PORT: u16 = 6666;
/// Largest datagram accepted
const MAX_DATAGRAM: usize = 65_536;

/// Source of already-buffered messages, polled without blocking
pub trait Inbox {
    /// Next pending message, or `None` if nothing is buffered right now
    fn try_next(&mut self) -> Option<ControlMessage>;

    /// Number of messages buffered at this moment
    fn backlog(&self) -> usize;
}

impl Inbox for VecDeque<ControlMessage> {
    fn try_next(&mut self) -> Option<ControlMessage> {
        self.pop_front()
    }

    fn backlog(&self) -> usize {
        self.len()
    }
}

/// Receives OSC datagrams on a UDP port
pub struct OscReceiver {
    local_addr: SocketAddr,
    messages: UnboundedReceiver<ControlMessage>,
    task: JoinHandle<()>,
}

impl OscReceiver {
    /// Bind `addr` and start receiving on `runtime`
    pub fn bind(addr: SocketAddr, runtime: &Handle) -> std::io::Result<Self> {
        let std_socket = std::net::UdpSocket::bind(addr)?;
        std_socket.set_nonblocking(true)?;
        let local_addr = std_socket.local_addr()?;

        let socket = {
            let _guard = runtime.enter();
            UdpSocket::from_std(std_socket)?
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            loop {
                let (len, peer) = match socket.recv_from(&mut buf).await {
                    Ok(received) => received,
                    Err(e) => {
                        tracing::warn!(error = %e, "Control socket receive failed");
                        continue;
                    }
                };

                match decode_packet(&buf[..len]) {
                    Ok(messages) => {
                        for message in messages {
                            if tx.send(message).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => tracing::warn!(peer = %peer, error = %e, "Dropping malformed datagram"),
                }
            }
        });

        tracing::info!(addr = %local_addr, "Listening for control messages");

        Ok(Self {
            local_addr,
            messages: rx,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Inbox for OscReceiver {
    fn try_next(&mut self) -> Option<ControlMessage> {
        match self.messages.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                tracing::error!("Control receiver task stopped");
                None
            }
        }
    }

    fn backlog(&self) -> usize {
        self.messages.len()
    }
}

impl Drop for OscReceiver {
    fn drop(&mut self) {
        self.task.abort();
    }
}
