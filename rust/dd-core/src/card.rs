//! Per-player score card.
//!
//! A slot moves from unset to a value exactly once; afterwards it is frozen for
//! the rest of the game. Totals are always recomputed from the slots.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::{upper_bonus, Category, NUM_CATS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("category {category} already scored ({existing})")]
    AlreadyScored { category: Category, existing: u32 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    slots: [Option<u32>; NUM_CATS],
}

impl ScoreCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> Option<u32> {
        self.slots[category.index()]
    }

    pub fn is_set(&self, category: Category) -> bool {
        self.get(category).is_some()
    }

    /// Commit a score. Fails without modifying the card if the slot is set.
    pub fn commit(&mut self, category: Category, score: u32) -> Result<(), CardError> {
        let slot = &mut self.slots[category.index()];
        if let Some(existing) = *slot {
            return Err(CardError::AlreadyScored { category, existing });
        }
        *slot = Some(score);
        Ok(())
    }

    pub fn open_categories(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL.into_iter().filter(|&c| !self.is_set(c))
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.filled() == NUM_CATS
    }

    pub fn upper_subtotal(&self) -> u32 {
        Category::UPPER
            .iter()
            .map(|&c| self.get(c).unwrap_or(0))
            .sum()
    }

    pub fn bonus(&self) -> u32 {
        upper_bonus(self.upper_subtotal())
    }

    /// Sum of all set categories (unset = 0) plus the upper bonus.
    pub fn total(&self) -> u32 {
        let raw: u32 = self.slots.iter().map(|s| s.unwrap_or(0)).sum();
        raw + self.bonus()
    }
}
