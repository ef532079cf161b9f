//! Single entry point for every event a peer handles.
//!
//! `dispatch` takes the current state and one event and returns the next
//! state plus the effects to execute. It never touches the transport or the
//! rendering surface itself, so the whole turn engine can be driven from tests.

use thiserror::Error;

use dd_core::engine::{self, TurnError};
use dd_core::{score, CardError, Category, GamePhase, Roller, NUM_DICE};
use dd_proto::protocol::{
    Activity, DiceSelect, DurationUpdate, PlayerAction, Ready, RollStart, ScoreOpts, ScoreUpdate,
};
use dd_proto::{Message, PlayerId};

use crate::effect::{Board, Effect, Notice};
use crate::peer::PeerState;
use crate::reconcile;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error(transparent)]
    Card(#[from] CardError),
    #[error("a roll is still animating")]
    Rolling,
    #[error("no die at index {0}")]
    BadDie(usize),
}

/// Something the local player asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalAction {
    SetReady(bool),
    ToggleHold(usize),
    Roll,
    SelectCategory(Category),
    SetDuration(u32),
    NewGame,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Local(LocalAction),
    Remote { from: PlayerId, msg: Message },
    PeerJoined,
    PeerLeft,
    /// The transport can no longer carry messages; the opponent is
    /// unreachable with it.
    LinkDown,
    /// The rendering surface finished a roll animation on `board`.
    RollFinished(Board),
}

/// Message timestamp source. Readings are strictly increasing.
#[derive(Debug, Clone)]
pub enum Clock {
    /// Wall clock (unix ms).
    System { last: u64 },
    /// Starts at `now` and advances by one per reading.
    Stepped { now: u64 },
}

impl Clock {
    pub fn system() -> Self {
        Clock::System { last: 0 }
    }

    pub fn stepped(start: u64) -> Self {
        Clock::Stepped { now: start }
    }

    pub fn now_ms(&mut self) -> u64 {
        match self {
            Clock::System { last } => {
                let t = dd_logging::now_ms().max(*last + 1);
                *last = t;
                t
            }
            Clock::Stepped { now } => {
                let t = *now;
                *now += 1;
                t
            }
        }
    }
}

/// Non-state inputs a transition may consume.
pub struct PeerContext {
    pub roller: Roller,
    pub clock: Clock,
}

impl PeerContext {
    pub fn new(roller: Roller, clock: Clock) -> Self {
        Self { roller, clock }
    }
}

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: PeerState,
    pub effects: Vec<Effect>,
}

impl Step {
    pub(crate) fn unchanged(state: &PeerState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }
}

pub fn dispatch(
    state: &PeerState,
    event: &Event,
    ctx: &mut PeerContext,
) -> Result<Step, ActionError> {
    match event {
        Event::Local(action) => apply_local(state, *action, ctx),
        Event::Remote { from, msg } => Ok(reconcile::apply_remote(state, from, msg)),
        Event::PeerJoined => {
            let mut next = state.clone();
            next.peer_connected = true;
            Ok(Step {
                state: next,
                effects: vec![Effect::Notify(Notice::PeerJoined)],
            })
        }
        Event::PeerLeft => {
            let mut next = state.clone();
            next.peer_connected = false;
            Ok(Step {
                state: next,
                effects: vec![Effect::Notify(Notice::PeerLeft)],
            })
        }
        Event::LinkDown => {
            let mut next = state.clone();
            next.link_up = false;
            next.peer_connected = false;
            let effects = if state.peer_connected {
                vec![Effect::Notify(Notice::PeerLeft)]
            } else {
                vec![]
            };
            Ok(Step {
                state: next,
                effects,
            })
        }
        Event::RollFinished(board) => Ok(roll_finished(state, *board, ctx)),
    }
}

fn apply_local(
    state: &PeerState,
    action: LocalAction,
    ctx: &mut PeerContext,
) -> Result<Step, ActionError> {
    let mut next = state.clone();
    let mut effects = Vec::new();
    let me = next.session.player_id.clone();

    match action {
        LocalAction::SetReady(is_ready) => {
            if next.game.game_phase != GamePhase::Waiting {
                return Err(TurnError::WrongPhase {
                    expected: GamePhase::Waiting,
                    actual: next.game.game_phase,
                }
                .into());
            }
            next.local_ready = is_ready;
            effects.push(Effect::Send(Message::Ready(Ready {
                player_id: me,
                is_ready,
                timestamp: ctx.clock.now_ms(),
            })));
            reconcile::try_open_gate(&mut next, &mut effects);
        }
        LocalAction::ToggleHold(idx) => {
            if idx >= NUM_DICE {
                return Err(ActionError::BadDie(idx));
            }
            if next.rolling {
                return Err(ActionError::Rolling);
            }
            engine::check_can_score(&next.game, next.me())?;
            next.dice.toggle_hold(idx);
            effects.push(Effect::Send(Message::DiceSelect(DiceSelect {
                player_id: me,
                selected_dice: next.dice.held,
                timestamp: ctx.clock.now_ms(),
            })));
        }
        LocalAction::Roll => {
            if next.rolling {
                return Err(ActionError::Rolling);
            }
            let (game, roll_number) = engine::consume_roll(next.game, next.me())?;
            let intent = ctx
                .roller
                .roll_intent(next.dice.held, next.duration_ms, roll_number);
            next.game = game;
            next.dice.apply_results(&intent.results);
            next.rolling = true;

            let ts = ctx.clock.now_ms();
            effects.push(Effect::Send(Message::RollStart(RollStart::from_intent(
                me.clone(),
                &intent,
                ts,
            ))));
            effects.push(Effect::Animate {
                board: Board::Own,
                selection: intent.selection,
                duration_ms: intent.duration_ms,
                target: intent.results,
            });
            effects.push(Effect::Send(Message::Action(PlayerAction {
                player_id: me,
                action: Activity::Rolling,
                timestamp: ctx.clock.now_ms(),
            })));
        }
        LocalAction::SelectCategory(category) => {
            if next.rolling {
                return Err(ActionError::Rolling);
            }
            engine::check_can_score(&next.game, next.me())?;
            let value = score(category, next.dice.faces);
            next.own_card.commit(category, value)?;

            let prev_phase = next.game.game_phase;
            next.game = engine::end_turn(next.game, next.totals())?;
            next.reset_dice();

            effects.push(Effect::Send(Message::ScoreUpdate(ScoreUpdate {
                player_id: me.clone(),
                category,
                score: value,
                timestamp: ctx.clock.now_ms(),
            })));
            effects.push(Effect::Send(Message::GameState(next.game)));
            effects.push(Effect::Send(Message::Action(PlayerAction {
                player_id: me,
                action: Activity::Idle,
                timestamp: ctx.clock.now_ms(),
            })));
            effects.push(Effect::ResetDice(Board::Own));
            effects.push(Effect::ResetDice(Board::Opponent));
            reconcile::phase_notices(prev_phase, &next, &mut effects);
        }
        LocalAction::SetDuration(ms) => {
            next.duration_ms = next.roll_config.clamp(ms);
            effects.push(Effect::Send(Message::Duration(DurationUpdate {
                player_id: me,
                duration: next.duration_ms,
                timestamp: ctx.clock.now_ms(),
            })));
        }
        LocalAction::NewGame => {
            let game = engine::reset_game(next.game)?;
            next.clear_game(game);
            effects.push(Effect::Send(Message::GameState(next.game)));
            effects.push(Effect::ResetDice(Board::Own));
            effects.push(Effect::ResetDice(Board::Opponent));
            reconcile::phase_notices(GamePhase::Finished, &next, &mut effects);
        }
    }

    Ok(Step {
        state: next,
        effects,
    })
}

/// Local animation done: publish the settled faces and the spent roll.
fn roll_finished(state: &PeerState, board: Board, ctx: &mut PeerContext) -> Step {
    if board != Board::Own || !state.rolling {
        return Step::unchanged(state);
    }
    let mut next = state.clone();
    next.rolling = false;
    let me = next.session.player_id.clone();
    let effects = vec![
        Effect::Send(Message::ScoreOpts(ScoreOpts {
            player_id: me.clone(),
            current_faces: next.dice.faces,
            rolls_left: next.game.rolls_left,
            timestamp: ctx.clock.now_ms(),
        })),
        Effect::Send(Message::GameState(next.game)),
        Effect::Send(Message::Action(PlayerAction {
            player_id: me,
            action: Activity::Selecting,
            timestamp: ctx.clock.now_ms(),
        })),
    ];
    Step {
        state: next,
        effects,
    }
}
