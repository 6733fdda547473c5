//! # Driftfield
//!
//! An ambient 2D particle backdrop: drifting points joined by proximity
//! lines whose opacity fades with distance.
//!
//! The engine is deliberately small and fixed-function. One activation owns
//! 100 particles, advances them once per display frame, and draws a disc per
//! particle plus a line per sufficiently-close pair. There is no rule system
//! and no per-instance configuration; the visual is the API.
//!
//! ## Quick Start
//!
//! ```ignore
//! fn main() {
//!     env_logger::init();
//!     driftfield::window::run().unwrap();
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`Particle`] is a plain data record; [`advance`] steps it one tick with
//!   wrap-around at the viewport edges.
//! - [`Canvas`] is the drawable-context seam. [`GpuCanvas`] implements it for
//!   real windows; tests implement it with a command recorder.
//! - [`Engine`] is the activation state machine. It talks to its [`Host`] for
//!   frame scheduling and resize subscriptions, which keeps start/stop
//!   testable without a display.
//! - [`window`] wires the engine to a winit window, with graceful inertness
//!   when no GPU context can be acquired.

pub mod engine;
pub mod error;
pub mod gpu;
pub mod particle;
pub mod render;
pub mod spawn;
pub mod viewport;
pub mod window;

pub use engine::{Engine, EngineState, FrameRequest, Host, ResizeSubscription};
pub use error::GpuError;
pub use glam::Vec2;
pub use gpu::GpuCanvas;
pub use particle::{advance, Particle, PARTICLE_COUNT};
pub use render::{connect_particles, draw_particle, Canvas, CONNECT_DISTANCE};
pub use spawn::spawn_particles;
pub use viewport::Viewport;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use driftfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::engine::{Engine, EngineState, FrameRequest, Host, ResizeSubscription};
    pub use crate::particle::{advance, Particle, PARTICLE_COUNT};
    pub use crate::render::{connect_particles, draw_particle, Canvas};
    pub use crate::spawn::spawn_particles;
    pub use crate::viewport::Viewport;
    pub use crate::Vec2;
}
