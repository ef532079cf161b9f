//! dd-core: Dice rules, scoring, score cards, turn transitions and configuration.

pub mod card;
pub mod chance;
pub mod config;
pub mod dice;
pub mod engine;
pub mod scoring;
pub mod spin;
pub mod state;

pub use card::{CardError, ScoreCard};
pub use chance::{RollIntent, RollResults, Roller};
pub use config::{Config, ConfigError};
pub use dice::{DiceSet, CANONICAL_FACES, NUM_DICE};
pub use engine::TurnError;
pub use scoring::{
    score, scores_for_dice, upper_bonus, Category, NUM_CATS, UPPER_BONUS, UPPER_BONUS_THRESHOLD,
};
pub use state::{GamePhase, GameState, PlayerNo, ROLLS_PER_TURN, ROUNDS};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_nonempty() {
        assert!(!VERSION.is_empty());
    }
}

#[cfg(test)]
mod chance_tests;
#[cfg(test)]
mod scoring_tests;
