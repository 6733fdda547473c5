//! Particle spawning.
//!
//! The whole field is created in one call at activation time; no particle is
//! added or removed afterwards.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::particle::Particle;
use crate::viewport::Viewport;

/// Disc radius range in pixels.
const SIZE_RANGE: std::ops::Range<f32> = 1.0..6.0;
/// Per-tick displacement range on each axis.
const SPEED_RANGE: std::ops::Range<f32> = -0.25..0.25;
/// Fill opacity range.
const ALPHA_RANGE: std::ops::Range<f32> = 0.1..0.3;

/// Spawn `count` particles uniformly over the current viewport.
///
/// Positions are drawn over `[0, width)` x `[0, height)` as the viewport
/// stands at call time; later resizes do not reshuffle the field. A 0-sized
/// axis spawns that coordinate at 0 (`gen_range` rejects empty ranges, so
/// the guard is load-bearing).
pub fn spawn_particles(count: u32, view: Viewport) -> Vec<Particle> {
    let mut rng = SmallRng::from_entropy();
    (0..count)
        .map(|_| Particle {
            x: random_coord(&mut rng, view.width),
            y: random_coord(&mut rng, view.height),
            size: rng.gen_range(SIZE_RANGE),
            speed_x: rng.gen_range(SPEED_RANGE),
            speed_y: rng.gen_range(SPEED_RANGE),
            alpha: rng.gen_range(ALPHA_RANGE),
        })
        .collect()
}

/// Uniform coordinate in `[0, extent)`; 0 when the axis has no extent.
fn random_coord(rng: &mut SmallRng, extent: f32) -> f32 {
    if extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}
