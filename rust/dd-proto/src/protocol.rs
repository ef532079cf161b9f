//! Peer message set.
//!
//! Every per-player fact carries the sender's `player_id` and a sender-clock
//! `timestamp` (unix ms). The game-state snapshot carries neither: it is a
//! full-state replacement, not an attributable fact.

use std::fmt;

use dd_core::{Category, GameState, RollIntent, RollResults, NUM_DICE};
use serde::{Deserialize, Serialize};

/// Wire protocol version.
pub const PROTOCOL_VERSION: u32 = 1;

/// Binary encoding of a held die in `RollStart.results`.
pub const HELD_SENTINEL: i8 = -1;

/// Longest accepted peer id, in bytes.
pub const MAX_PLAYER_ID_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId(s.to_string())
    }
}

/// What the opponent is doing, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Rolling,
    Selecting,
    Idle,
}

impl Activity {
    pub fn as_u8(self) -> u8 {
        match self {
            Activity::Rolling => 0,
            Activity::Selecting => 1,
            Activity::Idle => 2,
        }
    }

    pub fn from_u8(v: u8) -> Option<Activity> {
        match v {
            0 => Some(Activity::Rolling),
            1 => Some(Activity::Selecting),
            2 => Some(Activity::Idle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ready {
    pub player_id: PlayerId,
    pub is_ready: bool,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceSelect {
    pub player_id: PlayerId,
    pub selected_dice: [bool; NUM_DICE],
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollStart {
    pub player_id: PlayerId,
    pub selected_dice: [bool; NUM_DICE],
    pub duration: u32,
    pub roll_number: u8,
    /// `None` = held die, unchanged.
    pub results: RollResults,
    pub timestamp: u64,
}

impl RollStart {
    pub fn from_intent(player_id: PlayerId, intent: &RollIntent, timestamp: u64) -> Self {
        Self {
            player_id,
            selected_dice: intent.selection,
            duration: intent.duration_ms,
            roll_number: intent.roll_number,
            results: intent.results,
            timestamp,
        }
    }

    pub fn intent(&self) -> RollIntent {
        RollIntent {
            selection: self.selected_dice,
            duration_ms: self.duration,
            roll_number: self.roll_number,
            results: self.results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAction {
    pub player_id: PlayerId,
    pub action: Activity,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationUpdate {
    pub player_id: PlayerId,
    pub duration: u32,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOpts {
    pub player_id: PlayerId,
    pub current_faces: [u8; NUM_DICE],
    pub rolls_left: u8,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdate {
    pub player_id: PlayerId,
    pub category: Category,
    pub score: u32,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    Ready(Ready),
    DiceSelect(DiceSelect),
    RollStart(RollStart),
    Action(PlayerAction),
    Duration(DurationUpdate),
    ScoreOpts(ScoreOpts),
    ScoreUpdate(ScoreUpdate),
    GameState(GameState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgKind {
    Ready = 1,
    DiceSelect = 2,
    RollStart = 3,
    Action = 4,
    Duration = 5,
    ScoreOpts = 6,
    ScoreUpdate = 7,
    GameState = 8,
}

impl MsgKind {
    pub fn from_u8(v: u8) -> Option<MsgKind> {
        Some(match v {
            1 => MsgKind::Ready,
            2 => MsgKind::DiceSelect,
            3 => MsgKind::RollStart,
            4 => MsgKind::Action,
            5 => MsgKind::Duration,
            6 => MsgKind::ScoreOpts,
            7 => MsgKind::ScoreUpdate,
            8 => MsgKind::GameState,
            _ => return None,
        })
    }

    /// Channel name used on the wire and in logs.
    pub fn name(self) -> &'static str {
        match self {
            MsgKind::Ready => "ready",
            MsgKind::DiceSelect => "diceSelect",
            MsgKind::RollStart => "rollStart",
            MsgKind::Action => "action",
            MsgKind::Duration => "duration",
            MsgKind::ScoreOpts => "scoreOpts",
            MsgKind::ScoreUpdate => "scoreUpdate",
            MsgKind::GameState => "gameState",
        }
    }
}

impl Message {
    pub fn kind(&self) -> MsgKind {
        match self {
            Message::Ready(_) => MsgKind::Ready,
            Message::DiceSelect(_) => MsgKind::DiceSelect,
            Message::RollStart(_) => MsgKind::RollStart,
            Message::Action(_) => MsgKind::Action,
            Message::Duration(_) => MsgKind::Duration,
            Message::ScoreOpts(_) => MsgKind::ScoreOpts,
            Message::ScoreUpdate(_) => MsgKind::ScoreUpdate,
            Message::GameState(_) => MsgKind::GameState,
        }
    }

    /// Sender id; `None` for the unattributed game-state snapshot.
    pub fn player_id(&self) -> Option<&PlayerId> {
        match self {
            Message::Ready(m) => Some(&m.player_id),
            Message::DiceSelect(m) => Some(&m.player_id),
            Message::RollStart(m) => Some(&m.player_id),
            Message::Action(m) => Some(&m.player_id),
            Message::Duration(m) => Some(&m.player_id),
            Message::ScoreOpts(m) => Some(&m.player_id),
            Message::ScoreUpdate(m) => Some(&m.player_id),
            Message::GameState(_) => None,
        }
    }

    pub fn timestamp(&self) -> Option<u64> {
        match self {
            Message::Ready(m) => Some(m.timestamp),
            Message::DiceSelect(m) => Some(m.timestamp),
            Message::RollStart(m) => Some(m.timestamp),
            Message::Action(m) => Some(m.timestamp),
            Message::Duration(m) => Some(m.timestamp),
            Message::ScoreOpts(m) => Some(m.timestamp),
            Message::ScoreUpdate(m) => Some(m.timestamp),
            Message::GameState(_) => None,
        }
    }
}
