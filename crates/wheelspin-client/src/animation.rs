//! The winner reveal: an eased spin that lands on the drawn slice.

use std::f64::consts::TAU;

use crate::renderer::{landing_rotation, normalize_angle};

/// Full turns added to every reveal before it settles.
pub const REVEAL_SPINS: f64 = 5.0;

/// Fraction of the remaining distance covered per frame.
pub const EASING: f64 = 0.05;

/// Below this remaining distance (radians) the wheel snaps to the target.
pub const SNAP_THRESHOLD: f64 = 0.01;

/// Result of advancing a spin by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinStep {
    /// Still moving; draw and step again next frame.
    Running,
    /// Landed exactly on the target.
    Finished,
}

/// An in-flight reveal.
///
/// ```
/// use wheelspin_client::{SpinAnimation, SpinStep, slice_at_pointer};
///
/// let spin = SpinAnimation::new(0.0, 2, 4);
/// let mut rotation = 0.0;
/// while spin.step(&mut rotation) == SpinStep::Running {}
/// assert_eq!(rotation, spin.target());
/// assert_eq!(slice_at_pointer(4, rotation), Some(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinAnimation {
    target: f64,
    winner_index: usize,
}

impl SpinAnimation {
    /// Plans a reveal from `rotation` that spins [`REVEAL_SPINS`] full
    /// turns and then brings slice `winner_index` of `count` under the
    /// pointer.
    pub fn new(rotation: f64, winner_index: usize, count: usize) -> Self {
        let landing = landing_rotation(winner_index, count);
        let delta = normalize_angle(landing - rotation);
        Self {
            target: rotation + REVEAL_SPINS * TAU + delta,
            winner_index,
        }
    }

    /// The rotation the spin ends at.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// The slice that ends under the pointer.
    pub fn winner_index(&self) -> usize {
        self.winner_index
    }

    /// Moves `rotation` one frame closer to the target.
    pub fn step(&self, rotation: &mut f64) -> SpinStep {
        let delta = self.target - *rotation;
        if delta.abs() < SNAP_THRESHOLD {
            *rotation = self.target;
            return SpinStep::Finished;
        }
        *rotation += delta * EASING;
        SpinStep::Running
    }
}
