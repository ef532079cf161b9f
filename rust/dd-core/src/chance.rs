//! Roll intents: the acting player draws every rolled face up front so the
//! mirroring peer can animate toward identical targets.
//!
//! Each non-held die gets an independent, uniform face in 1..=6. Held dice are
//! reported as `None` ("unchanged").

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::dice::{is_valid_face, NUM_DICE};

/// Per-die roll outcome; `None` means the die was held and keeps its face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RollResults(pub [Option<u8>; NUM_DICE]);

impl RollResults {
    pub fn rolled_count(&self) -> usize {
        self.0.iter().filter(|r| r.is_some()).count()
    }

    /// All present faces are in 1..=6.
    pub fn is_valid(&self) -> bool {
        self.0.iter().flatten().all(|&f| is_valid_face(f))
    }

    /// Held positions agree with `selection` (held ⇔ `None`).
    pub fn matches_selection(&self, selection: &[bool; NUM_DICE]) -> bool {
        self.0
            .iter()
            .zip(selection.iter())
            .all(|(r, &held)| r.is_none() == held)
    }
}

/// Payload produced by the acting player at roll time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollIntent {
    pub selection: [bool; NUM_DICE],
    pub duration_ms: u32,
    /// 1..=3 within the turn.
    pub roll_number: u8,
    pub results: RollResults,
}

/// Source of dice faces. Real play seeds from the OS; tests and simulations
/// pass a fixed seed so every draw is reproducible.
#[derive(Debug, Clone)]
pub struct Roller {
    rng: ChaCha8Rng,
}

impl Roller {
    pub fn from_entropy() -> Self {
        Roller {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Roller {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub fn face(&mut self) -> u8 {
        self.rng().gen_range(1..=6)
    }

    /// Draw results for every die not marked in `selection`.
    pub fn draw(&mut self, selection: &[bool; NUM_DICE]) -> RollResults {
        let mut out = [None; NUM_DICE];
        for (r, &held) in out.iter_mut().zip(selection.iter()) {
            if !held {
                *r = Some(self.face());
            }
        }
        RollResults(out)
    }

    pub fn roll_intent(
        &mut self,
        selection: [bool; NUM_DICE],
        duration_ms: u32,
        roll_number: u8,
    ) -> RollIntent {
        RollIntent {
            selection,
            duration_ms,
            roll_number,
            results: self.draw(&selection),
        }
    }
}
