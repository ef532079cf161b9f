//! Rendering seam: whatever spins the dice and reports when they settle.

use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

use dd_core::spin::{plan_roll, Spin};
use dd_core::{RollResults, CANONICAL_FACES, NUM_DICE};

use crate::effect::Board;

pub trait RollSurface {
    /// Start spinning the unheld dice of `board` toward `target`.
    fn animate_roll(
        &mut self,
        board: Board,
        selection: [bool; NUM_DICE],
        duration_ms: u32,
        target: RollResults,
    );

    fn reset(&mut self, board: Board);

    fn set_faces(&mut self, board: Board, faces: [u8; NUM_DICE]);

    /// Boards whose animation completed since the last poll.
    fn poll_finished(&mut self) -> Vec<Board>;
}

/// No pixels: every animation completes on the next poll.
pub struct HeadlessSurface {
    faces: [[u8; NUM_DICE]; 2],
    spins: [[Option<Spin>; NUM_DICE]; 2],
    pending: Vec<Board>,
    rng: ChaCha8Rng,
    animations: u64,
}

impl HeadlessSurface {
    pub fn new(seed: u64) -> Self {
        Self {
            faces: [CANONICAL_FACES; 2],
            spins: [[None; NUM_DICE]; 2],
            pending: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            animations: 0,
        }
    }

    /// Faces currently shown on `board`.
    pub fn faces(&self, board: Board) -> [u8; NUM_DICE] {
        self.faces[board.idx()]
    }

    /// Flourish planned for the last roll on `board`; `None` for held dice.
    pub fn last_spins(&self, board: Board) -> [Option<Spin>; NUM_DICE] {
        self.spins[board.idx()]
    }

    pub fn animations(&self) -> u64 {
        self.animations
    }
}

impl RollSurface for HeadlessSurface {
    fn animate_roll(
        &mut self,
        board: Board,
        _selection: [bool; NUM_DICE],
        _duration_ms: u32,
        target: RollResults,
    ) {
        let spins = plan_roll(&target, &mut self.rng);
        let faces = &mut self.faces[board.idx()];
        for (i, spin) in spins.iter().enumerate() {
            if let Some(s) = spin {
                faces[i] = s.face;
            }
        }
        self.spins[board.idx()] = spins;
        self.animations += 1;
        if !self.pending.contains(&board) {
            self.pending.push(board);
        }
    }

    fn reset(&mut self, board: Board) {
        self.faces[board.idx()] = CANONICAL_FACES;
        self.spins[board.idx()] = [None; NUM_DICE];
    }

    fn set_faces(&mut self, board: Board, faces: [u8; NUM_DICE]) {
        self.faces[board.idx()] = faces;
    }

    fn poll_finished(&mut self) -> Vec<Board> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_settles_on_target_and_keeps_held_faces() {
        let mut s = HeadlessSurface::new(7);
        s.set_faces(Board::Opponent, [2, 2, 2, 2, 2]);
        let target = RollResults([Some(6), None, Some(1), None, Some(4)]);
        s.animate_roll(
            Board::Opponent,
            [false, true, false, true, false],
            1000,
            target,
        );
        assert_eq!(s.faces(Board::Opponent), [6, 2, 1, 2, 4]);
        assert!(s.last_spins(Board::Opponent)[1].is_none());
        assert_eq!(s.poll_finished(), vec![Board::Opponent]);
        assert!(s.poll_finished().is_empty());
        assert_eq!(s.faces(Board::Own), CANONICAL_FACES);
    }
}
