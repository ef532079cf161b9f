//! Turn state machine: pure transitions over `GameState`.
//!
//! These functions are the only place phase, turn ownership and the round
//! counter change. The acting peer computes a transition once and broadcasts
//! the resulting snapshot; the other peer replaces its copy wholesale.

use thiserror::Error;

use crate::state::{GamePhase, GameState, PlayerNo, ROLLS_PER_TURN, ROUNDS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("expected phase {expected:?}, game is {actual:?}")]
    WrongPhase {
        expected: GamePhase,
        actual: GamePhase,
    },
    #[error("player {player} cannot act, it is player {current}'s turn")]
    NotYourTurn { player: PlayerNo, current: PlayerNo },
    #[error("no rolls left this turn")]
    NoRollsLeft,
    #[error("at least one roll is required before scoring")]
    NotRolledYet,
    #[error("both players must be ready")]
    NotReady,
    #[error("invalid state: {msg}")]
    InvalidState { msg: &'static str },
}

pub fn validate_state(s: &GameState) -> Result<(), TurnError> {
    if !(1..=ROUNDS).contains(&s.current_round) {
        return Err(TurnError::InvalidState {
            msg: "current_round must be in 1..=12",
        });
    }
    if s.rolls_left > ROLLS_PER_TURN {
        return Err(TurnError::InvalidState {
            msg: "rolls_left must be in 0..=3",
        });
    }
    match (s.game_phase, s.winner) {
        (GamePhase::Finished, None) => Err(TurnError::InvalidState {
            msg: "finished game must record a winner",
        }),
        (GamePhase::Waiting | GamePhase::Playing, Some(_)) => Err(TurnError::InvalidState {
            msg: "winner only allowed once finished",
        }),
        _ => Ok(()),
    }
}

fn expect_phase(s: &GameState, expected: GamePhase) -> Result<(), TurnError> {
    if s.game_phase != expected {
        return Err(TurnError::WrongPhase {
            expected,
            actual: s.game_phase,
        });
    }
    Ok(())
}

fn expect_turn(s: &GameState, player: PlayerNo) -> Result<(), TurnError> {
    expect_phase(s, GamePhase::Playing)?;
    if s.current_player != player {
        return Err(TurnError::NotYourTurn {
            player,
            current: s.current_player,
        });
    }
    Ok(())
}

/// Fresh game (round 1, ready-gate).
pub fn new_game() -> GameState {
    GameState::new()
}

/// `Waiting -> Playing` once both ready flags are set. Player 1 opens every round.
pub fn open_gate(
    mut state: GameState,
    local_ready: bool,
    remote_ready: bool,
) -> Result<GameState, TurnError> {
    validate_state(&state)?;
    expect_phase(&state, GamePhase::Waiting)?;
    if !(local_ready && remote_ready) {
        return Err(TurnError::NotReady);
    }
    state.game_phase = GamePhase::Playing;
    state.current_player = PlayerNo::One;
    state.rolls_left = ROLLS_PER_TURN;
    Ok(state)
}

/// Spend one roll. Returns the new state and the 1-based roll number.
pub fn consume_roll(mut state: GameState, player: PlayerNo) -> Result<(GameState, u8), TurnError> {
    validate_state(&state)?;
    expect_turn(&state, player)?;
    if state.rolls_left == 0 {
        return Err(TurnError::NoRollsLeft);
    }
    let roll_number = ROLLS_PER_TURN - state.rolls_left + 1;
    state.rolls_left -= 1;
    Ok((state, roll_number))
}

/// Whether `player` may commit a category right now (card checks are separate).
pub fn check_can_score(state: &GameState, player: PlayerNo) -> Result<(), TurnError> {
    validate_state(state)?;
    expect_turn(state, player)?;
    if !state.has_rolled() {
        return Err(TurnError::NotRolledYet);
    }
    Ok(())
}

/// Hand the turn over after the current player scored.
///
/// `totals` are both players' card totals *after* the commit, indexed by
/// `PlayerNo::idx`; they only matter when the game ends.
pub fn end_turn(mut state: GameState, totals: [u32; 2]) -> Result<GameState, TurnError> {
    validate_state(&state)?;
    expect_phase(&state, GamePhase::Playing)?;

    let outgoing = state.current_player;
    state.current_player = outgoing.other();
    state.rolls_left = ROLLS_PER_TURN;

    if outgoing == PlayerNo::Two {
        if state.current_round >= ROUNDS {
            state.game_phase = GamePhase::Finished;
            state.winner = Some(winner_by_totals(totals));
        } else {
            state.current_round += 1;
            state.game_phase = GamePhase::Waiting;
        }
    }
    Ok(state)
}

/// Higher total wins; a tie goes to player 1.
pub fn winner_by_totals(totals: [u32; 2]) -> PlayerNo {
    if totals[PlayerNo::Two.idx()] > totals[PlayerNo::One.idx()] {
        PlayerNo::Two
    } else {
        PlayerNo::One
    }
}

/// `Finished -> Waiting` with everything cleared.
pub fn reset_game(state: GameState) -> Result<GameState, TurnError> {
    expect_phase(&state, GamePhase::Finished)?;
    Ok(new_game())
}
