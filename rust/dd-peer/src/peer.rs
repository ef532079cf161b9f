//! Everything one peer knows: its own authoritative fields and its mirrors of the opponent.
//!
//! Write ownership: `own_card` and `dice` are written only by local actions;
//! `opponent_card`, `opponent_dice` and the other `opponent_*` fields only by
//! inbound messages. `game` is written by whichever peer is acting and
//! replaced wholesale on the other side.

use dd_core::config::RollConfig;
use dd_core::{score, Category, DiceSet, GamePhase, GameState, PlayerNo, ScoreCard, NUM_CATS};
use dd_proto::protocol::Activity;
use dd_proto::PlayerId;

use crate::session::{ConnectionInfo, PlayerSession};

/// One row of a score sheet as displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Scored(u32),
    Preview(u32),
    Open,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeerState {
    pub session: PlayerSession,
    pub room_id: String,
    pub game: GameState,

    pub own_card: ScoreCard,
    pub opponent_card: ScoreCard,
    pub dice: DiceSet,
    pub opponent_dice: DiceSet,
    /// Local roll animation in flight.
    pub rolling: bool,

    pub local_ready: bool,
    pub remote_ready: bool,
    pub last_remote_ready_ts: Option<u64>,
    /// Gate opened via snapshot before the opponent's ready arrived.
    pub absorb_next_remote_ready: bool,

    pub opponent_id: Option<PlayerId>,
    pub opponent_action: Activity,
    pub duration_ms: u32,
    pub opponent_duration_ms: u32,
    pub opponent_rolls_left: u8,
    pub peer_connected: bool,
    /// Our own link to the room is up.
    pub link_up: bool,

    pub roll_config: RollConfig,
}

impl PeerState {
    pub fn new(session: PlayerSession, room_id: impl Into<String>, roll_config: RollConfig) -> Self {
        let duration = roll_config.clamp(roll_config.default_duration_ms);
        Self {
            session,
            room_id: room_id.into(),
            game: GameState::new(),
            own_card: ScoreCard::new(),
            opponent_card: ScoreCard::new(),
            dice: DiceSet::canonical(),
            opponent_dice: DiceSet::canonical(),
            rolling: false,
            local_ready: false,
            remote_ready: false,
            last_remote_ready_ts: None,
            absorb_next_remote_ready: false,
            opponent_id: None,
            opponent_action: Activity::Idle,
            duration_ms: duration,
            opponent_duration_ms: duration,
            opponent_rolls_left: dd_core::ROLLS_PER_TURN,
            peer_connected: false,
            link_up: false,
            roll_config,
        }
    }

    pub fn me(&self) -> PlayerNo {
        self.session.player_no
    }

    pub fn is_my_turn(&self) -> bool {
        self.game.game_phase == GamePhase::Playing && self.game.current_player == self.me()
    }

    pub fn is_opponent_turn(&self) -> bool {
        self.game.game_phase == GamePhase::Playing && self.game.current_player == self.me().other()
    }

    /// Card totals indexed by `PlayerNo::idx`.
    pub fn totals(&self) -> [u32; 2] {
        let mut out = [0u32; 2];
        out[self.me().idx()] = self.own_card.total();
        out[self.me().other().idx()] = self.opponent_card.total();
        out
    }

    /// Own sheet; open rows preview the current dice once a settled roll exists.
    pub fn preview_own(&self) -> [Cell; NUM_CATS] {
        let show = self.is_my_turn() && self.game.has_rolled() && !self.rolling;
        sheet(&self.own_card, &self.dice.faces, show)
    }

    /// Opponent sheet; open rows preview the mirrored dice during their turn.
    pub fn preview_opponent(&self) -> [Cell; NUM_CATS] {
        let show =
            self.is_opponent_turn() && self.opponent_rolls_left < dd_core::ROLLS_PER_TURN;
        sheet(&self.opponent_card, &self.opponent_dice.faces, show)
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            room_id: self.room_id.clone(),
            player_id: self.session.player_id.clone(),
            role: self.session.role,
            is_connected: self.link_up,
            peer_connected: self.peer_connected,
            game_player_number: self.me(),
            is_ready: self.local_ready,
            opponent_ready: self.remote_ready,
        }
    }

    /// Back to a fresh game: cards, dice and ready flags cleared.
    pub(crate) fn clear_game(&mut self, game: GameState) {
        self.game = game;
        self.own_card = ScoreCard::new();
        self.opponent_card = ScoreCard::new();
        self.dice.reset();
        self.opponent_dice.reset();
        self.rolling = false;
        self.local_ready = false;
        self.remote_ready = false;
        self.absorb_next_remote_ready = false;
        self.opponent_rolls_left = dd_core::ROLLS_PER_TURN;
        self.opponent_action = Activity::Idle;
    }

    /// Start-of-turn dice reset for both boards.
    pub(crate) fn reset_dice(&mut self) {
        self.dice.reset();
        self.opponent_dice.reset();
        self.rolling = false;
    }
}

fn sheet(card: &ScoreCard, faces: &[u8; 5], show_preview: bool) -> [Cell; NUM_CATS] {
    let mut out = [Cell::Open; NUM_CATS];
    for (cell, c) in out.iter_mut().zip(Category::ALL) {
        *cell = match card.get(c) {
            Some(v) => Cell::Scored(v),
            None if show_preview => Cell::Preview(score(c, *faces)),
            None => Cell::Open,
        };
    }
    out
}
