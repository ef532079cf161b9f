//! Game loops: both peers in one process, or one peer against a remote.

use std::thread;
use std::time::Duration;

use thiserror::Error;

use dd_core::{GamePhase, PlayerNo};
use dd_peer::{DriverError, HeadlessSurface, PeerDriver, Transport};

use crate::bot::Bot;

/// Idle iterations before a local pair is declared stuck.
const MAX_IDLE_SPINS: u32 = 2_000_000;

#[derive(Debug, Error)]
pub enum PlayError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("no progress after {0} idle iterations")]
    Stalled(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Totals indexed by `PlayerNo::idx`, as seen by the reporting peer.
    pub totals: [u32; 2],
    pub winner: Option<PlayerNo>,
    /// Both peers hold identical game state and mirrored cards.
    /// `None` when only one side was observed.
    pub agree: Option<bool>,
}

pub type Peer<T> = PeerDriver<T, HeadlessSurface>;

/// Drive two local peers until both see the game finished.
pub fn play_pair<A: Transport, B: Transport>(
    a: &mut Peer<A>,
    bot_a: &mut Bot,
    b: &mut Peer<B>,
    bot_b: &mut Bot,
) -> Result<Outcome, PlayError> {
    let mut idle = 0u32;
    loop {
        let mut progress = a.pump()? + b.pump()?;
        if finished(a) && finished(b) {
            break;
        }
        if let Some(action) = bot_a.next_action(a.state()) {
            a.act(action)?;
            progress += 1;
        }
        if let Some(action) = bot_b.next_action(b.state()) {
            b.act(action)?;
            progress += 1;
        }
        if progress == 0 {
            idle += 1;
            if idle > MAX_IDLE_SPINS {
                return Err(PlayError::Stalled(idle));
            }
            thread::yield_now();
        } else {
            idle = 0;
        }
    }

    let (sa, sb) = (a.state(), b.state());
    let agree = sa.game == sb.game
        && sa.own_card == sb.opponent_card
        && sa.opponent_card == sb.own_card;
    Ok(Outcome {
        totals: sa.totals(),
        winner: sa.game.winner,
        agree: Some(agree),
    })
}

/// Drive one peer against a remote until the game finishes or the peer leaves.
/// Returns `None` when the opponent left first.
pub fn play_remote<T: Transport>(
    peer: &mut Peer<T>,
    bot: &mut Bot,
) -> Result<Option<Outcome>, DriverError> {
    let mut seen_peer = false;
    loop {
        let progress = peer.pump()?;
        let s = peer.state();
        seen_peer |= s.peer_connected;
        if s.game.game_phase == GamePhase::Finished {
            return Ok(Some(Outcome {
                totals: s.totals(),
                winner: s.game.winner,
                agree: None,
            }));
        }
        if seen_peer && !s.peer_connected {
            return Ok(None);
        }
        match bot.next_action(s) {
            Some(action) => peer.act(action)?,
            None if progress == 0 => thread::sleep(Duration::from_millis(1)),
            None => {}
        }
    }
}

fn finished<T: Transport>(p: &Peer<T>) -> bool {
    p.state().game.game_phase == GamePhase::Finished
}
