//! dd-peer: Peer-synchronized turn engine.
//!
//! Each peer holds a `PeerState`. Local actions and inbound messages go
//! through `dispatch`, which returns the next state and a list of effects
//! (messages to broadcast, animations to start). `PeerDriver` wires that to a
//! `Transport` and a `RollSurface`.

pub mod dispatch;
pub mod driver;
pub mod effect;
pub mod peer;
mod reconcile;
pub mod session;
pub mod surface;
pub mod tcp;
pub mod transport;

pub use dispatch::{dispatch, ActionError, Clock, Event, LocalAction, PeerContext, Step};
pub use driver::{DriverError, PeerDriver};
pub use effect::{Board, DropReason, Effect, Notice};
pub use peer::{Cell, PeerState};
pub use session::{ConnectionInfo, PlayerSession, Role};
pub use surface::{HeadlessSurface, RollSurface};
pub use tcp::TcpLink;
pub use transport::{MemoryLink, MemoryLinkOptions, Transport, TransportError, TransportEvent};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
