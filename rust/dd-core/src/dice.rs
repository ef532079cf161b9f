//! Five dice plus the held mask.

use serde::{Deserialize, Serialize};

use crate::chance::RollResults;

pub const NUM_DICE: usize = 5;

/// All ones.
pub const CANONICAL_FACES: [u8; NUM_DICE] = [1; NUM_DICE];

pub fn is_valid_face(f: u8) -> bool {
    (1..=6).contains(&f)
}

pub fn faces_valid(faces: &[u8; NUM_DICE]) -> bool {
    faces.iter().all(|&f| is_valid_face(f))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceSet {
    pub faces: [u8; NUM_DICE],
    /// `held[i]` excludes die `i` from the next roll.
    pub held: [bool; NUM_DICE],
}

impl DiceSet {
    /// All ones, nothing held.
    pub fn canonical() -> Self {
        Self {
            faces: CANONICAL_FACES,
            held: [false; NUM_DICE],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::canonical();
    }

    pub fn toggle_hold(&mut self, idx: usize) -> Option<bool> {
        let h = self.held.get_mut(idx)?;
        *h = !*h;
        Some(*h)
    }

    pub fn held_count(&self) -> usize {
        self.held.iter().filter(|&&h| h).count()
    }

    /// Write every rolled face; held (`None`) positions keep their value.
    pub fn apply_results(&mut self, results: &RollResults) {
        for (face, r) in self.faces.iter_mut().zip(results.0.iter()) {
            if let Some(v) = r {
                *face = *v;
            }
        }
    }
}

impl Default for DiceSet {
    fn default() -> Self {
        Self::canonical()
    }
}
