//! Particle record and the per-tick simulation step.

use crate::viewport::Viewport;

/// Number of particles in one activation.
pub const PARTICLE_COUNT: u32 = 100;

/// One point of the drift field.
///
/// Position mutates every tick; `size`, the speeds, and `alpha` are fixed at
/// spawn time. Hue is not per-particle state: every disc and line uses the
/// crate-wide accent color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Position in surface-pixel coordinates.
    pub x: f32,
    pub y: f32,
    /// Disc radius in pixels, in `[1, 6)`.
    pub size: f32,
    /// Per-tick displacement, each axis in `[-0.25, 0.25)`.
    pub speed_x: f32,
    pub speed_y: f32,
    /// Fill opacity, in `[0.1, 0.3)`.
    pub alpha: f32,
}

/// Advance a particle one tick, wrapping at the viewport edges.
///
/// A particle leaving an edge snaps to the exact opposite edge value (0 or
/// the full dimension) rather than folding the overshoot, so the seam jump
/// is off by up to one tick of travel. That is the intended behavior; do not
/// replace it with a modulus. No inter-particle coupling: calls are
/// order-independent across the field.
pub fn advance(p: &mut Particle, view: Viewport) {
    p.x += p.speed_x;
    p.y += p.speed_y;

    if p.x > view.width {
        p.x = 0.0;
    }
    if p.x < 0.0 {
        p.x = view.width;
    }
    if p.y > view.height {
        p.y = 0.0;
    }
    if p.y < 0.0 {
        p.y = view.height;
    }
}
