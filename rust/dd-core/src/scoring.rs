//! Category scoring (pure, side-effect free).
//!
//! Either peer may call these for its own dice or for the mirrored opponent
//! dice to render a "what you could score" preview.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of scoring categories on a card.
pub const NUM_CATS: usize = 12;

/// Upper-section subtotal needed for the bonus.
pub const UPPER_BONUS_THRESHOLD: u32 = 63;

/// Bonus awarded once the upper subtotal reaches the threshold.
pub const UPPER_BONUS: u32 = 35;

pub const SMALL_STRAIGHT_SCORE: u32 = 15;
pub const LARGE_STRAIGHT_SCORE: u32 = 30;
pub const YAHTZEE_SCORE: u32 = 50;

/// The twelve fixed scoring categories, in card order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Ones,
    Twos,
    Threes,
    Fours,
    Fives,
    Sixes,
    FullHouse,
    FourOfKind,
    SmallStraight,
    LargeStraight,
    Yahtzee,
    Chance,
}

impl Category {
    pub const ALL: [Category; NUM_CATS] = [
        Category::Ones,
        Category::Twos,
        Category::Threes,
        Category::Fours,
        Category::Fives,
        Category::Sixes,
        Category::FullHouse,
        Category::FourOfKind,
        Category::SmallStraight,
        Category::LargeStraight,
        Category::Yahtzee,
        Category::Chance,
    ];

    pub const UPPER: [Category; 6] = [
        Category::Ones,
        Category::Twos,
        Category::Threes,
        Category::Fours,
        Category::Fives,
        Category::Sixes,
    ];

    /// Card slot index (0..12).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Category> {
        Category::ALL.get(idx).copied()
    }

    pub fn is_upper(self) -> bool {
        self.index() < 6
    }

    /// Wire name (matches the serde representation).
    pub fn name(self) -> &'static str {
        match self {
            Category::Ones => "ones",
            Category::Twos => "twos",
            Category::Threes => "threes",
            Category::Fours => "fours",
            Category::Fives => "fives",
            Category::Sixes => "sixes",
            Category::FullHouse => "fullHouse",
            Category::FourOfKind => "fourOfKind",
            Category::SmallStraight => "smallStraight",
            Category::LargeStraight => "largeStraight",
            Category::Yahtzee => "yahtzee",
            Category::Chance => "chance",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Per-face occurrence counts; `counts[f - 1]` is how often face `f` appears.
fn face_counts(faces: [u8; 5]) -> [u8; 6] {
    let mut counts = [0u8; 6];
    for f in faces {
        debug_assert!((1..=6).contains(&f), "face out of range: {f}");
        counts[(f.clamp(1, 6) - 1) as usize] += 1;
    }
    counts
}

fn contains_run(counts: &[u8; 6], start: usize, len: usize) -> bool {
    counts[start..start + len].iter().all(|&c| c > 0)
}

/// Score `faces` under `category`.
///
/// Input faces must be in 1..=6. Order does not matter.
pub fn score(category: Category, faces: [u8; 5]) -> u32 {
    let counts = face_counts(faces);
    let sum: u32 = faces.iter().map(|&f| f as u32).sum();

    match category {
        Category::Ones
        | Category::Twos
        | Category::Threes
        | Category::Fours
        | Category::Fives
        | Category::Sixes => {
            let face = category.index() + 1;
            counts[face - 1] as u32 * face as u32
        }
        Category::FourOfKind => {
            if counts.iter().any(|&c| c >= 4) {
                sum
            } else {
                0
            }
        }
        Category::FullHouse => {
            // A yahtzee has no second value, so it is not a full house here.
            let three = counts.iter().any(|&c| c == 3);
            let two = counts.iter().any(|&c| c == 2);
            if three && two {
                sum
            } else {
                0
            }
        }
        Category::SmallStraight => {
            if (0..3).any(|start| contains_run(&counts, start, 4)) {
                SMALL_STRAIGHT_SCORE
            } else {
                0
            }
        }
        Category::LargeStraight => {
            let distinct = counts.iter().filter(|&&c| c > 0).count();
            if distinct == 5 && (contains_run(&counts, 0, 5) || contains_run(&counts, 1, 5)) {
                LARGE_STRAIGHT_SCORE
            } else {
                0
            }
        }
        Category::Yahtzee => {
            if counts.iter().any(|&c| c == 5) {
                YAHTZEE_SCORE
            } else {
                0
            }
        }
        Category::Chance => sum,
    }
}

/// Scores for every category, indexed by `Category::index`.
pub fn scores_for_dice(faces: [u8; 5]) -> [u32; NUM_CATS] {
    let mut out = [0u32; NUM_CATS];
    for cat in Category::ALL {
        out[cat.index()] = score(cat, faces);
    }
    out
}

/// Bonus for an upper-section subtotal.
pub fn upper_bonus(upper_subtotal: u32) -> u32 {
    if upper_subtotal >= UPPER_BONUS_THRESHOLD {
        UPPER_BONUS
    } else {
        0
    }
}
