//! Event loop glue: feeds events through `dispatch` and executes the effects.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use dd_core::GamePhase;
use dd_logging::{
    debug_log, now_ms, GameOverEventV1, MessageDroppedEventV1, MessageEventV1, NdjsonWriter,
    PhaseEventV1, SessionStartEventV1, VersionInfoV1, EVENT_SCHEMA_VERSION,
};
use dd_proto::{Message, PROTOCOL_VERSION};

use crate::dispatch::{dispatch, ActionError, Event, LocalAction, PeerContext};
use crate::effect::{Effect, Notice};
use crate::peer::PeerState;
use crate::surface::RollSurface;
use crate::transport::{Transport, TransportError, TransportEvent};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub struct PeerDriver<T: Transport, S: RollSurface> {
    state: PeerState,
    ctx: PeerContext,
    transport: T,
    surface: S,
    events: Option<NdjsonWriter>,
}

impl<T: Transport, S: RollSurface> PeerDriver<T, S> {
    /// `transport` must already be connected; the peer starts with its link up.
    pub fn new(mut state: PeerState, ctx: PeerContext, transport: T, surface: S) -> Self {
        state.link_up = transport.is_open();
        Self {
            state,
            ctx,
            transport,
            surface,
            events: None,
        }
    }

    pub fn with_event_log(mut self, writer: NdjsonWriter) -> Self {
        self.events = Some(writer);
        self
    }

    pub fn state(&self) -> &PeerState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn log_session_start(&mut self, app_id: &str, config_hash: Option<String>) {
        let ev = SessionStartEventV1 {
            event: "session_start",
            ts_ms: now_ms(),
            v: VersionInfoV1 {
                schema_version: EVENT_SCHEMA_VERSION,
                protocol_version: PROTOCOL_VERSION,
                app_id: app_id.to_string(),
            },
            room_id: self.state.room_id.clone(),
            player_id: self.state.session.player_id.to_string(),
            player_no: self.state.me().as_u8(),
            config_hash,
        };
        self.log(&ev);
    }

    /// Run one local action to completion.
    pub fn act(&mut self, action: LocalAction) -> Result<(), DriverError> {
        self.run(&Event::Local(action))
    }

    /// Drain pending transport events, then surface completions.
    /// Returns how many events were handled.
    pub fn pump(&mut self) -> Result<usize, DriverError> {
        let mut handled = 0;
        loop {
            let event = match self.transport.try_recv() {
                Ok(Some(ev)) => ev,
                Ok(None) => break,
                Err(TransportError::Decode(e)) => {
                    debug_log(
                        "dd_peer::driver::pump",
                        "dropping garbled message",
                        json!({ "error": e.to_string() }),
                    );
                    handled += 1;
                    continue;
                }
                Err(TransportError::Disconnected) => {
                    handled += 1;
                    self.link_lost()?;
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            handled += 1;
            match event {
                TransportEvent::Message { from, msg } => {
                    self.log_message("msg_in", &msg);
                    self.run(&Event::Remote { from, msg })?;
                }
                TransportEvent::PeerJoined(_) => self.run(&Event::PeerJoined)?,
                TransportEvent::PeerLeft(_) => self.run(&Event::PeerLeft)?,
            }
        }
        if !self.transport.is_open() {
            self.link_lost()?;
        }
        for board in self.surface.poll_finished() {
            handled += 1;
            self.run(&Event::RollFinished(board))?;
        }
        Ok(handled)
    }

    pub fn flush_log(&mut self) {
        if let Some(w) = self.events.as_mut() {
            if let Err(e) = w.flush() {
                debug_log(
                    "dd_peer::driver::flush_log",
                    "event log flush failed",
                    json!({ "error": e.to_string() }),
                );
            }
        }
    }

    fn run(&mut self, event: &Event) -> Result<(), DriverError> {
        let step = dispatch(&self.state, event, &mut self.ctx)?;
        self.state = step.state;
        for effect in step.effects {
            self.execute(effect)?;
        }
        Ok(())
    }

    fn link_lost(&mut self) -> Result<(), DriverError> {
        if self.state.link_up {
            self.run(&Event::LinkDown)?;
        }
        Ok(())
    }

    fn execute(&mut self, effect: Effect) -> Result<(), DriverError> {
        match effect {
            Effect::Send(msg) => {
                self.log_message("msg_out", &msg);
                // Peer gone: keep showing the last known state.
                if let Err(e) = self.transport.send(&msg) {
                    debug_log(
                        "dd_peer::driver::execute",
                        "send failed",
                        json!({ "kind": msg.kind().name(), "error": e.to_string() }),
                    );
                    self.link_lost()?;
                }
            }
            Effect::Animate {
                board,
                selection,
                duration_ms,
                target,
            } => self
                .surface
                .animate_roll(board, selection, duration_ms, target),
            Effect::ResetDice(board) => self.surface.reset(board),
            Effect::SetFaces { board, faces } => self.surface.set_faces(board, faces),
            Effect::Notify(notice) => self.log_notice(&notice),
            Effect::Dropped { kind, reason } => {
                debug_log(
                    "dd_peer::driver::execute",
                    "message dropped",
                    json!({ "kind": kind.name(), "reason": reason.as_str() }),
                );
                let ev = MessageDroppedEventV1 {
                    event: "msg_dropped",
                    ts_ms: now_ms(),
                    player_id: self.state.session.player_id.to_string(),
                    kind: kind.name(),
                    reason: reason.as_str().to_string(),
                };
                self.log(&ev);
            }
        }
        Ok(())
    }

    fn log_message(&mut self, event: &'static str, msg: &Message) {
        if self.events.is_none() {
            return;
        }
        let ev = MessageEventV1 {
            event,
            ts_ms: now_ms(),
            player_id: self.state.session.player_id.to_string(),
            kind: msg.kind().name(),
            round: self.state.game.current_round,
            body: serde_json::to_value(msg).unwrap_or(Value::Null),
        };
        self.log(&ev);
    }

    fn log_notice(&mut self, notice: &Notice) {
        let player_id = self.state.session.player_id.to_string();
        match *notice {
            Notice::PhaseChanged { from, to, round } => {
                let ev = PhaseEventV1 {
                    event: "phase",
                    ts_ms: now_ms(),
                    player_id,
                    from: phase_name(from),
                    to: phase_name(to),
                    round,
                    current_player: self.state.game.current_player.as_u8(),
                };
                self.log(&ev);
            }
            Notice::GameOver { winner, totals } => {
                let ev = GameOverEventV1 {
                    event: "game_over",
                    ts_ms: now_ms(),
                    player_id,
                    winner: winner.as_u8(),
                    totals,
                };
                self.log(&ev);
                self.flush_log();
            }
            Notice::OpponentScored { category, score } => debug_log(
                "dd_peer::driver::log_notice",
                "opponent scored",
                json!({ "category": category.name(), "score": score }),
            ),
            Notice::PeerJoined | Notice::PeerLeft => debug_log(
                "dd_peer::driver::log_notice",
                "peer presence",
                json!({ "connected": self.state.peer_connected }),
            ),
        }
    }

    fn log<E: Serialize>(&mut self, ev: &E) {
        let Some(w) = self.events.as_mut() else {
            return;
        };
        if let Err(e) = w.write_event(ev) {
            debug_log(
                "dd_peer::driver::log",
                "event log write failed",
                json!({ "error": e.to_string() }),
            );
        }
    }
}

fn phase_name(p: GamePhase) -> &'static str {
    match p {
        GamePhase::Waiting => "waiting",
        GamePhase::Playing => "playing",
        GamePhase::Finished => "finished",
    }
}
