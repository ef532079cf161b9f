//! Inbound message handling: echo suppression, then last-write-wins onto the mirrors.
//!
//! Nothing here writes `own_card` or `dice`. The opponent is trusted: an
//! out-of-turn or stale message is applied as received, except where the
//! mirror itself forbids it (a second score for the same category, an older
//! ready).

use dd_core::engine;
use dd_core::{GamePhase, ROLLS_PER_TURN};
use dd_proto::{Message, PlayerId};

use crate::dispatch::Step;
use crate::effect::{Board, DropReason, Effect, Notice};
use crate::peer::PeerState;

pub(crate) fn apply_remote(state: &PeerState, from: &PlayerId, msg: &Message) -> Step {
    let kind = msg.kind();
    let own = &state.session.player_id;
    if from == own || msg.player_id() == Some(own) {
        return dropped(state, kind, DropReason::Echo);
    }

    let mut next = state.clone();
    let mut effects = Vec::new();
    if next.opponent_id.is_none() {
        next.opponent_id = Some(from.clone());
    }

    match msg {
        Message::Ready(m) => {
            if let Some(last) = next.last_remote_ready_ts {
                if m.timestamp == last {
                    return dropped(state, kind, DropReason::Duplicate);
                }
                if m.timestamp < last {
                    return dropped(state, kind, DropReason::Stale);
                }
            }
            next.last_remote_ready_ts = Some(m.timestamp);
            if m.is_ready && next.absorb_next_remote_ready {
                next.absorb_next_remote_ready = false;
                effects.push(Effect::Dropped {
                    kind,
                    reason: DropReason::Absorbed,
                });
            } else {
                next.remote_ready = m.is_ready;
                try_open_gate(&mut next, &mut effects);
            }
        }
        Message::DiceSelect(m) => {
            next.opponent_dice.held = m.selected_dice;
        }
        Message::RollStart(m) => {
            if !m.results.is_valid() || !m.results.matches_selection(&m.selected_dice) {
                return dropped(state, kind, DropReason::Invalid);
            }
            next.opponent_dice.held = m.selected_dice;
            next.opponent_dice.apply_results(&m.results);
            effects.push(Effect::Animate {
                board: Board::Opponent,
                selection: m.selected_dice,
                duration_ms: m.duration,
                target: m.results,
            });
        }
        Message::Action(m) => {
            next.opponent_action = m.action;
        }
        Message::Duration(m) => {
            next.opponent_duration_ms = m.duration;
        }
        Message::ScoreOpts(m) => {
            // Heals a mirror that missed the roll itself.
            if next.opponent_dice.faces != m.current_faces {
                next.opponent_dice.faces = m.current_faces;
                effects.push(Effect::SetFaces {
                    board: Board::Opponent,
                    faces: m.current_faces,
                });
            }
            next.opponent_rolls_left = m.rolls_left;
        }
        Message::ScoreUpdate(m) => {
            if next.opponent_card.commit(m.category, m.score).is_err() {
                return dropped(state, kind, DropReason::Duplicate);
            }
            effects.push(Effect::Notify(Notice::OpponentScored {
                category: m.category,
                score: m.score,
            }));
        }
        Message::GameState(snap) => {
            if engine::validate_state(snap).is_err() {
                return dropped(state, kind, DropReason::Invalid);
            }
            let prev = next.game;
            if prev == *snap {
                return dropped(state, kind, DropReason::Duplicate);
            }

            if prev.game_phase == GamePhase::Finished && snap.game_phase == GamePhase::Waiting {
                next.clear_game(*snap);
                effects.push(Effect::ResetDice(Board::Own));
                effects.push(Effect::ResetDice(Board::Opponent));
            } else {
                next.game = *snap;
                let gate_opened =
                    prev.game_phase == GamePhase::Waiting && snap.game_phase == GamePhase::Playing;
                if gate_opened {
                    next.local_ready = false;
                    if !next.remote_ready {
                        next.absorb_next_remote_ready = true;
                    }
                    next.remote_ready = false;
                }
                let turn_changed = gate_opened
                    || prev.current_player != snap.current_player
                    || prev.current_round != snap.current_round;
                if turn_changed {
                    next.reset_dice();
                    next.opponent_rolls_left = ROLLS_PER_TURN;
                    effects.push(Effect::ResetDice(Board::Own));
                    effects.push(Effect::ResetDice(Board::Opponent));
                }
            }
            if snap.current_player != next.me() {
                next.opponent_rolls_left = snap.rolls_left;
            }
            phase_notices(prev.game_phase, &next, &mut effects);
        }
    }

    Step {
        state: next,
        effects,
    }
}

/// Open the ready-gate if both flags are set. Flags are consumed on opening.
pub(crate) fn try_open_gate(next: &mut PeerState, effects: &mut Vec<Effect>) {
    let prev_phase = next.game.game_phase;
    let Ok(game) = engine::open_gate(next.game, next.local_ready, next.remote_ready) else {
        return;
    };
    next.game = game;
    next.local_ready = false;
    next.remote_ready = false;
    next.opponent_rolls_left = ROLLS_PER_TURN;
    next.reset_dice();
    effects.push(Effect::ResetDice(Board::Own));
    effects.push(Effect::ResetDice(Board::Opponent));
    phase_notices(prev_phase, next, effects);
}

pub(crate) fn phase_notices(prev: GamePhase, next: &PeerState, effects: &mut Vec<Effect>) {
    let to = next.game.game_phase;
    if prev == to {
        return;
    }
    effects.push(Effect::Notify(Notice::PhaseChanged {
        from: prev,
        to,
        round: next.game.current_round,
    }));
    if let (GamePhase::Finished, Some(winner)) = (to, next.game.winner) {
        effects.push(Effect::Notify(Notice::GameOver {
            winner,
            totals: next.totals(),
        }));
    }
}

fn dropped(state: &PeerState, kind: dd_proto::MsgKind, reason: DropReason) -> Step {
    let mut step = Step::unchanged(state);
    step.effects.push(Effect::Dropped { kind, reason });
    step
}
