//! TCP transport: one host, one guest, length-delimited codec frames.
//!
//! The guest opens with a JSON hello frame naming the room; the host answers
//! with its own id or a rejection. After that every frame is one encoded
//! `Message`. A reader thread feeds inbound frames into a channel so
//! `try_recv` never blocks.

use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use serde::{Deserialize, Serialize};
use serde_json::json;

use dd_logging::debug_log;

use dd_proto::frame::{read_frame, write_frame};
use dd_proto::{decode, encode, DecodeError, Message, PlayerId, PROTOCOL_VERSION};

use crate::transport::{Transport, TransportError, TransportEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Hello {
    app_id: String,
    protocol_version: u32,
    room_id: String,
    peer_id: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HelloReply {
    accepted: bool,
    peer_id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

fn read_hello(stream: &mut TcpStream) -> Result<Hello, TransportError> {
    stream.set_nodelay(true)?;
    let bytes = read_frame(stream)?.ok_or(TransportError::Disconnected)?;
    Ok(serde_json::from_slice(&bytes)?)
}

enum Inbound {
    Msg(Message),
    Garbled(DecodeError),
    Closed,
}

pub struct TcpLink {
    self_id: PlayerId,
    peer_id: PlayerId,
    stream: TcpStream,
    rx: Receiver<Inbound>,
    joined_pending: bool,
    left: bool,
}

impl TcpLink {
    /// Wait on `listener` for a guest naming `room_id`. Guests asking for
    /// another room are turned away and the wait continues, as are
    /// connections whose hello is truncated, oversized or not JSON. Only a
    /// failing `accept` ends the wait.
    pub fn host(
        listener: &TcpListener,
        app_id: &str,
        room_id: &str,
        self_id: PlayerId,
    ) -> Result<TcpLink, TransportError> {
        loop {
            let (mut stream, addr) = listener.accept()?;
            let hello = match read_hello(&mut stream) {
                Ok(h) => h,
                Err(e) => {
                    debug_log(
                        "dd_peer::tcp::host",
                        "dropping connection without a usable hello",
                        json!({ "addr": addr.to_string(), "error": e.to_string() }),
                    );
                    continue;
                }
            };
            let reject = if hello.app_id != app_id {
                Some(format!("unknown app {:?}", hello.app_id))
            } else if hello.protocol_version != PROTOCOL_VERSION {
                Some(format!(
                    "protocol version {} (host speaks {PROTOCOL_VERSION})",
                    hello.protocol_version
                ))
            } else if hello.room_id != room_id {
                Some(format!("no room {:?}", hello.room_id))
            } else {
                None
            };
            let reply = HelloReply {
                accepted: reject.is_none(),
                peer_id: self_id.clone(),
                reason: reject,
            };
            let sent = serde_json::to_vec(&reply)
                .map_err(TransportError::from)
                .and_then(|bytes| write_frame(&mut stream, &bytes).map_err(TransportError::from));
            if let Err(e) = sent {
                debug_log(
                    "dd_peer::tcp::host",
                    "hello reply not delivered",
                    json!({ "addr": addr.to_string(), "error": e.to_string() }),
                );
                continue;
            }
            if reply.accepted {
                return TcpLink::start(self_id, hello.peer_id, stream);
            }
        }
    }

    /// Connect to a host and ask for `room_id`.
    pub fn join<A: ToSocketAddrs>(
        addr: A,
        app_id: &str,
        room_id: &str,
        self_id: PlayerId,
    ) -> Result<TcpLink, TransportError> {
        let mut stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let hello = Hello {
            app_id: app_id.to_string(),
            protocol_version: PROTOCOL_VERSION,
            room_id: room_id.to_string(),
            peer_id: self_id.clone(),
        };
        write_frame(&mut stream, &serde_json::to_vec(&hello)?)?;
        let bytes = read_frame(&mut stream)?.ok_or(TransportError::Disconnected)?;
        let reply: HelloReply = serde_json::from_slice(&bytes)?;
        if !reply.accepted {
            return Err(TransportError::Rejected(
                reply.reason.unwrap_or_else(|| "rejected".to_string()),
            ));
        }
        TcpLink::start(self_id, reply.peer_id, stream)
    }

    fn start(
        self_id: PlayerId,
        peer_id: PlayerId,
        stream: TcpStream,
    ) -> Result<TcpLink, TransportError> {
        let mut reader = stream.try_clone()?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || loop {
            let inbound = match read_frame(&mut reader) {
                Ok(Some(bytes)) => match decode(&bytes) {
                    Ok(msg) => Inbound::Msg(msg),
                    Err(e) => Inbound::Garbled(e),
                },
                Ok(None) | Err(_) => {
                    let _ = tx.send(Inbound::Closed);
                    return;
                }
            };
            if tx.send(inbound).is_err() {
                return;
            }
        });
        Ok(TcpLink {
            self_id,
            peer_id,
            stream,
            rx,
            joined_pending: true,
            left: false,
        })
    }

    pub fn peer_id(&self) -> &PlayerId {
        &self.peer_id
    }
}

impl Transport for TcpLink {
    fn self_id(&self) -> &PlayerId {
        &self.self_id
    }

    fn send(&mut self, msg: &Message) -> Result<(), TransportError> {
        if self.left {
            return Err(TransportError::Disconnected);
        }
        write_frame(&mut self.stream, &encode(msg))?;
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<TransportEvent>, TransportError> {
        if self.joined_pending {
            self.joined_pending = false;
            return Ok(Some(TransportEvent::PeerJoined(self.peer_id.clone())));
        }
        if self.left {
            return Ok(None);
        }
        match self.rx.try_recv() {
            Ok(Inbound::Msg(msg)) => Ok(Some(TransportEvent::Message {
                from: self.peer_id.clone(),
                msg,
            })),
            Ok(Inbound::Garbled(e)) => Err(e.into()),
            Ok(Inbound::Closed) | Err(TryRecvError::Disconnected) => {
                self.left = true;
                Ok(Some(TransportEvent::PeerLeft(self.peer_id.clone())))
            }
            Err(TryRecvError::Empty) => Ok(None),
        }
    }

    fn is_open(&self) -> bool {
        !self.left
    }
}

impl Drop for TcpLink {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }
}
