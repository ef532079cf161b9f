//! Headless player: decides the next local action from what a peer can see.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

use dd_core::{score, Category, GamePhase, ROLLS_PER_TURN};
use dd_peer::{LocalAction, PeerState};

/// Scores at or above this end the turn without further rolls.
const GOOD_ENOUGH: u32 = 25;

pub struct Bot {
    rng: ChaCha8Rng,
    max_rolls: u8,
    /// Reroll decision for (round, rolls_left), drawn once per settled roll.
    plan: Option<(u8, u8, bool)>,
}

impl Bot {
    pub fn new(seed: u64, max_rolls: u8) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_rolls: max_rolls.clamp(1, ROLLS_PER_TURN),
            plan: None,
        }
    }

    pub fn next_action(&mut self, s: &PeerState) -> Option<LocalAction> {
        match s.game.game_phase {
            GamePhase::Waiting if !s.local_ready && s.peer_connected => {
                Some(LocalAction::SetReady(true))
            }
            GamePhase::Playing if s.is_my_turn() && !s.rolling => Some(self.turn_action(s)),
            _ => None,
        }
    }

    fn turn_action(&mut self, s: &PeerState) -> LocalAction {
        let used = ROLLS_PER_TURN - s.game.rolls_left;
        if used == 0 {
            return LocalAction::Roll;
        }
        let (best, best_score) = best_open(s);
        if used < self.max_rolls && best_score < GOOD_ENOUGH && self.wants_reroll(s) {
            let keep = keep_mask(&s.dice.faces);
            if let Some(i) = (0..keep.len()).find(|&i| keep[i] != s.dice.held[i]) {
                return LocalAction::ToggleHold(i);
            }
            return LocalAction::Roll;
        }
        LocalAction::SelectCategory(best)
    }

    fn wants_reroll(&mut self, s: &PeerState) -> bool {
        let key = (s.game.current_round, s.game.rolls_left);
        match self.plan {
            Some((round, left, go)) if (round, left) == key => go,
            _ => {
                let go = self.rng.gen_bool(0.8);
                self.plan = Some((key.0, key.1, go));
                go
            }
        }
    }
}

/// Highest-scoring open category; earliest wins ties.
fn best_open(s: &PeerState) -> (Category, u32) {
    let mut best: Option<(Category, u32)> = None;
    for c in s.own_card.open_categories() {
        let v = score(c, s.dice.faces);
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((c, v));
        }
    }
    // A playing turn always has an open category.
    best.unwrap_or((Category::Chance, 0))
}

/// Hold every die showing the most common face (higher face on ties).
fn keep_mask(faces: &[u8; 5]) -> [bool; 5] {
    let mut counts = [0u8; 7];
    for &f in faces {
        counts[f as usize] += 1;
    }
    let target = (1..=6u8)
        .max_by_key(|&f| (counts[f as usize], f))
        .unwrap_or(6);
    faces.map(|f| f == target)
}
