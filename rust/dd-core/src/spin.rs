//! Local animation flourish for a roll.
//!
//! Every peer picks its own extra turns and directions, so the motion differs
//! between screens, but the resting orientation is always the canonical one
//! for the target face.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use rand::Rng;

use crate::chance::RollResults;
use crate::dice::NUM_DICE;

/// Euler angles (radians) of a die at rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Resting orientation showing `face` toward the camera.
pub fn rest_orientation(face: u8) -> Orientation {
    let (x, y) = match face {
        2 => (FRAC_PI_2, 0.0),
        3 => (0.0, -FRAC_PI_2),
        4 => (0.0, FRAC_PI_2),
        5 => (-FRAC_PI_2, 0.0),
        6 => (0.0, PI),
        _ => (0.0, 0.0),
    };
    Orientation { x, y, z: 0.0 }
}

pub const MIN_EXTRA_TURNS: u8 = 2;
pub const MAX_EXTRA_TURNS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub face: u8,
    /// Extra full turns per axis (x, y, z).
    pub turns: [u8; 3],
    /// +1 or -1 per axis.
    pub direction: [i8; 3],
}

impl Spin {
    /// Orientation at the end of the animation (before snapping to rest).
    pub fn final_orientation(&self) -> Orientation {
        let rest = rest_orientation(self.face);
        let extra = |axis: usize| TAU * self.turns[axis] as f64 * self.direction[axis] as f64;
        Orientation {
            x: rest.x + extra(0),
            y: rest.y + extra(1),
            z: rest.z + extra(2),
        }
    }
}

pub fn plan_spin<R: Rng + ?Sized>(face: u8, rng: &mut R) -> Spin {
    let mut turns = [0u8; 3];
    let mut direction = [1i8; 3];
    for axis in 0..3 {
        turns[axis] = rng.gen_range(MIN_EXTRA_TURNS..=MAX_EXTRA_TURNS);
        direction[axis] = if rng.gen_bool(0.5) { 1 } else { -1 };
    }
    Spin {
        face,
        turns,
        direction,
    }
}

/// Spin plans for every rolled die; held dice stay still.
pub fn plan_roll<R: Rng + ?Sized>(results: &RollResults, rng: &mut R) -> [Option<Spin>; NUM_DICE] {
    let mut out = [None; NUM_DICE];
    for (slot, r) in out.iter_mut().zip(results.0.iter()) {
        *slot = r.map(|face| plan_spin(face, rng));
    }
    out
}

/// Reduce an angle to [0, TAU).
pub fn normalize(angle: f64) -> f64 {
    angle.rem_euclid(TAU)
}
