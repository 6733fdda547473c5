//! Render loop controller: activation state machine and host seam.
//!
//! The engine never talks to winit or wgpu directly. Its [`Host`] hands out
//! frame-request tokens and resize subscriptions; tests drive it with a fake
//! host and a recording canvas, [`crate::window`] with the real ones.

use crate::particle::{advance, Particle, PARTICLE_COUNT};
use crate::render::{connect_particles, draw_particle, Canvas};
use crate::spawn::spawn_particles;
use crate::viewport::Viewport;

/// Token for one pending frame callback.
///
/// Held by the engine between requesting a frame and the callback firing.
/// Cancelling it on deactivation guarantees the next scheduled frame never
/// runs a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest(pub u64);

/// Handle for a resize-notification subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSubscription(pub u64);

/// Services the hosting environment provides to the engine.
///
/// The host owns the actual scheduling machinery (a winit window in
/// production, a queue in tests) and calls the engine back serially:
/// [`Engine::on_frame`] for each granted frame request, [`Engine::resize`]
/// for each notification while subscribed. Callbacks never overlap; the
/// whole system is single-threaded and cooperative.
pub trait Host {
    /// Ask to be called back once on the next display frame.
    fn request_frame(&mut self) -> FrameRequest;
    /// Cancel a pending frame request. Unknown or already-fired tokens are
    /// ignored.
    fn cancel_frame(&mut self, request: FrameRequest);
    /// Start delivering resize notifications.
    fn subscribe_resize(&mut self) -> ResizeSubscription;
    /// Stop delivering resize notifications.
    fn unsubscribe_resize(&mut self, subscription: ResizeSubscription);
    /// Current drawable-surface size in pixels.
    fn surface_size(&self) -> (f32, f32);
}

/// Activation state. There are no intermediate states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Inactive,
    Active,
}

/// The drift-field engine: 100 particles, one clear→simulate→draw cycle per
/// granted frame, for as long as it is active.
pub struct Engine {
    state: EngineState,
    viewport: Viewport,
    particles: Vec<Particle>,
    pending_frame: Option<FrameRequest>,
    resize_subscription: Option<ResizeSubscription>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            state: EngineState::Inactive,
            viewport: Viewport::default(),
            particles: Vec::new(),
            pending_frame: None,
            resize_subscription: None,
        }
    }

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == EngineState::Active
    }

    /// Dimensions the simulation currently wraps against.
    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The live particle field. Empty while inactive.
    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mount the engine: read the surface size into the viewport, spawn the
    /// field, subscribe to resizes, and request the first frame.
    ///
    /// The caller is responsible for acquiring a drawable context first; an
    /// activation without one should simply never be attempted, leaving the
    /// engine inert (see [`crate::window`]). Activating an already-active
    /// engine is a no-op.
    pub fn activate<H: Host>(&mut self, host: &mut H) {
        if self.is_active() {
            return;
        }

        let (width, height) = host.surface_size();
        self.viewport = Viewport::new(width, height);
        self.particles = spawn_particles(PARTICLE_COUNT, self.viewport);
        self.resize_subscription = Some(host.subscribe_resize());
        self.pending_frame = Some(host.request_frame());
        self.state = EngineState::Active;

        log::debug!(
            "drift field activated: {}x{}, {} particles",
            width,
            height,
            self.particles.len()
        );
    }

    /// Unmount the engine, releasing the pending frame request and the
    /// resize subscription exactly once each.
    ///
    /// Safe to call repeatedly: the second call finds both handles already
    /// taken and does nothing.
    pub fn deactivate<H: Host>(&mut self, host: &mut H) {
        if let Some(request) = self.pending_frame.take() {
            host.cancel_frame(request);
        }
        if let Some(subscription) = self.resize_subscription.take() {
            host.unsubscribe_resize(subscription);
        }
        self.particles.clear();

        if self.state == EngineState::Active {
            self.state = EngineState::Inactive;
            log::debug!("drift field deactivated");
        }
    }

    /// Re-read the host surface size into the cached viewport.
    ///
    /// Accepts whatever the host reports, 0x0 included. Spawned positions
    /// are not reshuffled; only the wrap bounds change.
    pub fn resize<H: Host>(&mut self, host: &H) {
        let (width, height) = host.surface_size();
        self.viewport = Viewport::new(width, height);
    }

    /// One frame callback from the host.
    ///
    /// Consumes the pending frame token; if there is none (never requested,
    /// or cancelled by deactivation) the callback does no work at all.
    /// Otherwise runs the full clear→simulate→draw cycle and requests the
    /// next frame. Returns whether a cycle ran, so the host knows to present
    /// the canvas.
    pub fn on_frame<H: Host, C: Canvas>(&mut self, host: &mut H, canvas: &mut C) -> bool {
        if self.pending_frame.take().is_none() {
            return false;
        }

        canvas.clear();
        for p in &mut self.particles {
            advance(p, self.viewport);
            draw_particle(p, canvas);
        }
        connect_particles(&self.particles, canvas);

        self.pending_frame = Some(host.request_frame());
        true
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
