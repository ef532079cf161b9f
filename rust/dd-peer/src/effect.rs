//! Commands produced by dispatch, executed by the driver.

use dd_core::{Category, GamePhase, PlayerNo, RollResults, NUM_DICE};
use dd_proto::{Message, MsgKind};

/// Which set of dice a rendering command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Board {
    Own,
    Opponent,
}

impl Board {
    pub fn idx(self) -> usize {
        match self {
            Board::Own => 0,
            Board::Opponent => 1,
        }
    }
}

/// Why an inbound message was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Our own broadcast reflected back.
    Echo,
    /// Same fact already applied.
    Duplicate,
    /// Older than the last applied message of that kind from the sender.
    Stale,
    /// A ready that belongs to a gate we already passed.
    Absorbed,
    /// Structurally valid but unusable.
    Invalid,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::Echo => "echo",
            DropReason::Duplicate => "duplicate",
            DropReason::Stale => "stale",
            DropReason::Absorbed => "absorbed",
            DropReason::Invalid => "invalid",
        }
    }
}

/// Things worth telling the user (or the event log) about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PhaseChanged { from: GamePhase, to: GamePhase, round: u8 },
    GameOver { winner: PlayerNo, totals: [u32; 2] },
    OpponentScored { category: Category, score: u32 },
    PeerJoined,
    PeerLeft,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Broadcast to the room.
    Send(Message),
    /// Spin `board` toward `target`; `None` entries stay put.
    Animate {
        board: Board,
        selection: [bool; NUM_DICE],
        duration_ms: u32,
        target: RollResults,
    },
    ResetDice(Board),
    SetFaces {
        board: Board,
        faces: [u8; NUM_DICE],
    },
    Notify(Notice),
    Dropped {
        kind: MsgKind,
        reason: DropReason,
    },
}
