//! Shared game state held independently by each peer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rounds per game.
pub const ROUNDS: u8 = 12;

/// Rolls available at the start of every turn.
pub const ROLLS_PER_TURN: u8 = 3;

/// Game-player number (1 or 2), fixed per room for a peer's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayerNo {
    One,
    Two,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("player number must be 1 or 2, got {0}")]
pub struct BadPlayerNo(pub u8);

impl PlayerNo {
    pub fn other(self) -> PlayerNo {
        match self {
            PlayerNo::One => PlayerNo::Two,
            PlayerNo::Two => PlayerNo::One,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            PlayerNo::One => 1,
            PlayerNo::Two => 2,
        }
    }

    /// 0-based index into per-player arrays.
    pub fn idx(self) -> usize {
        self.as_u8() as usize - 1
    }
}

impl TryFrom<u8> for PlayerNo {
    type Error = BadPlayerNo;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(PlayerNo::One),
            2 => Ok(PlayerNo::Two),
            other => Err(BadPlayerNo(other)),
        }
    }
}

impl From<PlayerNo> for u8 {
    fn from(p: PlayerNo) -> u8 {
        p.as_u8()
    }
}

impl fmt::Display for PlayerNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    /// Ready-gate: both players must signal ready.
    Waiting,
    /// A turn owned by `current_player` is in progress.
    Playing,
    /// Terminal; `winner` is set.
    Finished,
}

impl GamePhase {
    pub fn as_u8(self) -> u8 {
        match self {
            GamePhase::Waiting => 0,
            GamePhase::Playing => 1,
            GamePhase::Finished => 2,
        }
    }

    pub fn from_u8(v: u8) -> Option<GamePhase> {
        match v {
            0 => Some(GamePhase::Waiting),
            1 => Some(GamePhase::Playing),
            2 => Some(GamePhase::Finished),
            _ => None,
        }
    }
}

/// Complete, wholesale-replaceable game snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub current_player: PlayerNo,
    /// 1..=12.
    pub current_round: u8,
    /// 0..=3.
    pub rolls_left: u8,
    pub game_phase: GamePhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerNo>,
}

impl GameState {
    /// Fresh game: round 1, player 1, ready-gate.
    pub fn new() -> Self {
        Self {
            current_player: PlayerNo::One,
            current_round: 1,
            rolls_left: ROLLS_PER_TURN,
            game_phase: GamePhase::Waiting,
            winner: None,
        }
    }

    pub fn is_turn_of(&self, player: PlayerNo) -> bool {
        self.game_phase == GamePhase::Playing && self.current_player == player
    }

    /// At least one roll has happened this turn.
    pub fn has_rolled(&self) -> bool {
        self.rolls_left < ROLLS_PER_TURN
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
