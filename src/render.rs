//! Drawing: the canvas seam, particle discs, and proximity lines.

use glam::Vec2;

use crate::particle::Particle;

/// Distance below which two particles are joined by a line.
pub const CONNECT_DISTANCE: f32 = 100.0;

/// Opacity scale for proximity lines: a coincident pair draws at 0.2,
/// fading linearly to 0 at [`CONNECT_DISTANCE`].
pub const LINE_ALPHA: f32 = 0.2;

/// Stroke width of proximity lines, in pixels.
pub const LINE_WIDTH: f32 = 1.0;

/// Accent color shared by discs and lines (linear RGB).
pub const ACCENT_COLOR: [f32; 3] = [0.51, 0.42, 0.96];

/// The drawable 2D context the engine paints into.
///
/// Coordinates are surface pixels, y down. Implementations blend the accent
/// hue at the given opacity and stroke lines [`LINE_WIDTH`] pixels wide. The
/// engine calls `clear` exactly once per frame, before any drawing.
pub trait Canvas {
    /// Erase the previous frame.
    fn clear(&mut self);
    /// Fill a disc of `radius` pixels centered at `center`.
    fn fill_circle(&mut self, center: Vec2, radius: f32, alpha: f32);
    /// Stroke a line from `from` to `to`.
    fn stroke_line(&mut self, from: Vec2, to: Vec2, alpha: f32);
}

/// Draw one particle as a filled disc.
pub fn draw_particle(p: &Particle, canvas: &mut impl Canvas) {
    canvas.fill_circle(Vec2::new(p.x, p.y), p.size, p.alpha);
}

/// Join every sufficiently-close pair of particles with a fading line.
///
/// A plain O(n^2) sweep over pairs `(a, b)` with `b >= a`. Self-pairs are
/// swept too; they emit a zero-length segment, a harmless no-op on screen.
/// At n = 100 that is 5050 candidate pairs per frame, cheap enough that
/// spatial indexing would only buy complexity plus a different draw order,
/// which is observable through blending. Keep the sweep.
pub fn connect_particles(particles: &[Particle], canvas: &mut impl Canvas) {
    for a in 0..particles.len() {
        for b in a..particles.len() {
            let dx = particles[a].x - particles[b].x;
            let dy = particles[a].y - particles[b].y;
            let distance = (dx * dx + dy * dy).sqrt();

            if distance < CONNECT_DISTANCE {
                let opacity = 1.0 - distance / CONNECT_DISTANCE;
                canvas.stroke_line(
                    Vec2::new(particles[a].x, particles[a].y),
                    Vec2::new(particles[b].x, particles[b].y),
                    opacity * LINE_ALPHA,
                );
            }
        }
    }
}
