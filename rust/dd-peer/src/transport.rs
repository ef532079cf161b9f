//! Transport seam plus an in-process linked pair.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

use thiserror::Error;

use dd_proto::frame::FrameError;
use dd_proto::{decode, encode, DecodeError, Message, PlayerId};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("handshake error: {0}")]
    Handshake(#[from] serde_json::Error),
    #[error("join rejected: {0}")]
    Rejected(String),
    #[error("transport disconnected")]
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Message { from: PlayerId, msg: Message },
    PeerJoined(PlayerId),
    PeerLeft(PlayerId),
}

/// A best-effort channel to the one other peer in the room.
pub trait Transport {
    fn self_id(&self) -> &PlayerId;

    /// Broadcast to the room.
    fn send(&mut self, msg: &Message) -> Result<(), TransportError>;

    /// Next pending event, without blocking.
    ///
    /// `Err(TransportError::Decode)` reports one garbled message; the link
    /// stays usable.
    fn try_recv(&mut self) -> Result<Option<TransportEvent>, TransportError>;

    /// Whether this end can still carry messages.
    fn is_open(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryLinkOptions {
    /// Reflect every send back to the sender.
    pub echo: bool,
    /// Deliver every send twice.
    pub duplicate: bool,
}

enum Wire {
    Bytes { from: PlayerId, bytes: Vec<u8> },
    Joined(PlayerId),
}

/// One end of an in-process link. Messages cross it as codec bytes.
pub struct MemoryLink {
    self_id: PlayerId,
    peer_id: PlayerId,
    opts: MemoryLinkOptions,
    tx_peer: Sender<Wire>,
    tx_self: Sender<Wire>,
    rx: Receiver<Wire>,
    alive: Arc<AtomicBool>,
    peer_alive: Arc<AtomicBool>,
    peer_gone: bool,
}

impl MemoryLink {
    /// Two connected ends; each starts with a pending `PeerJoined`.
    pub fn pair(a: PlayerId, b: PlayerId, opts: MemoryLinkOptions) -> (MemoryLink, MemoryLink) {
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        let _ = tx_a.send(Wire::Joined(b.clone()));
        let _ = tx_b.send(Wire::Joined(a.clone()));
        let alive_a = Arc::new(AtomicBool::new(true));
        let alive_b = Arc::new(AtomicBool::new(true));
        let end_a = MemoryLink {
            self_id: a.clone(),
            peer_id: b.clone(),
            opts,
            tx_peer: tx_b.clone(),
            tx_self: tx_a.clone(),
            rx: rx_a,
            alive: Arc::clone(&alive_a),
            peer_alive: Arc::clone(&alive_b),
            peer_gone: false,
        };
        let end_b = MemoryLink {
            self_id: b,
            peer_id: a,
            opts,
            tx_peer: tx_a,
            tx_self: tx_b,
            rx: rx_b,
            alive: alive_b,
            peer_alive: alive_a,
            peer_gone: false,
        };
        (end_a, end_b)
    }

    /// Deliver raw bytes to the peer as if sent by us (tests garbled input).
    pub fn inject_raw(&mut self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.tx_peer
            .send(Wire::Bytes {
                from: self.self_id.clone(),
                bytes,
            })
            .map_err(|_| TransportError::Disconnected)
    }
}

impl Transport for MemoryLink {
    fn self_id(&self) -> &PlayerId {
        &self.self_id
    }

    fn send(&mut self, msg: &Message) -> Result<(), TransportError> {
        let bytes = encode(msg);
        let copies = if self.opts.duplicate { 2 } else { 1 };
        for _ in 0..copies {
            let wire = Wire::Bytes {
                from: self.self_id.clone(),
                bytes: bytes.clone(),
            };
            // The peer may already be gone; sends are best-effort.
            let _ = self.tx_peer.send(wire);
        }
        if self.opts.echo {
            let _ = self.tx_self.send(Wire::Bytes {
                from: self.self_id.clone(),
                bytes,
            });
        }
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<TransportEvent>, TransportError> {
        match self.rx.try_recv() {
            Ok(Wire::Bytes { from, bytes }) => {
                let msg = decode(&bytes)?;
                Ok(Some(TransportEvent::Message { from, msg }))
            }
            Ok(Wire::Joined(id)) => Ok(Some(TransportEvent::PeerJoined(id))),
            Err(TryRecvError::Empty) => {
                // Our own `tx_self` keeps the channel open; peer departure
                // is tracked separately.
                if !self.peer_gone && !self.peer_alive.load(Ordering::Acquire) {
                    self.peer_gone = true;
                    return Ok(Some(TransportEvent::PeerLeft(self.peer_id.clone())));
                }
                Ok(None)
            }
            Err(TryRecvError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}
