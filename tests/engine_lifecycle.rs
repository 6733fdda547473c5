//! Integration tests for the activation lifecycle.
//!
//! These drive the engine exactly the way a real host does, but through a
//! fake host that ledgers every frame request, cancellation, subscription,
//! and unsubscription, plus a canvas that records draw commands.

use driftfield::prelude::*;

// ============================================================================
// Test host and canvas
// ============================================================================

#[derive(Default)]
struct FakeHost {
    size: (f32, f32),
    next_token: u64,
    pending: Vec<u64>,
    cancel_calls: usize,
    subscribe_calls: usize,
    unsubscribe_calls: usize,
    subscribed: Vec<u64>,
}

impl FakeHost {
    fn new(width: f32, height: f32) -> Self {
        Self {
            size: (width, height),
            ..Default::default()
        }
    }
}

impl Host for FakeHost {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_token += 1;
        // winit coalesces redraw requests into a single outstanding frame;
        // the newly requested redraw supersedes the just-fired one.
        self.pending.clear();
        self.pending.push(self.next_token);
        FrameRequest(self.next_token)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.pending.retain(|&t| t != request.0);
        self.cancel_calls += 1;
    }

    fn subscribe_resize(&mut self) -> ResizeSubscription {
        self.next_token += 1;
        self.subscribed.push(self.next_token);
        self.subscribe_calls += 1;
        ResizeSubscription(self.next_token)
    }

    fn unsubscribe_resize(&mut self, subscription: ResizeSubscription) {
        self.subscribed.retain(|&t| t != subscription.0);
        self.unsubscribe_calls += 1;
    }

    fn surface_size(&self) -> (f32, f32) {
        self.size
    }
}

#[derive(Default)]
struct RecordingCanvas {
    clears: usize,
    circles: Vec<(Vec2, f32, f32)>,
    lines: Vec<(Vec2, Vec2, f32)>,
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self) {
        self.clears += 1;
        self.circles.clear();
        self.lines.clear();
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, alpha: f32) {
        self.circles.push((center, radius, alpha));
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, alpha: f32) {
        self.lines.push((from, to, alpha));
    }
}

// ============================================================================
// Activation
// ============================================================================

#[test]
fn test_activation_spawns_exactly_one_hundred() {
    let mut host = FakeHost::new(1280.0, 720.0);
    let mut engine = Engine::new();
    engine.activate(&mut host);

    assert_eq!(engine.state(), EngineState::Active);
    assert_eq!(engine.particles().len(), PARTICLE_COUNT as usize);
    assert_eq!(host.subscribe_calls, 1);
    assert_eq!(host.pending.len(), 1);
}

#[test]
fn test_activation_spawns_inside_viewport() {
    let mut host = FakeHost::new(1280.0, 720.0);
    let mut engine = Engine::new();
    engine.activate(&mut host);

    for p in engine.particles() {
        assert!(p.x >= 0.0 && p.x < 1280.0);
        assert!(p.y >= 0.0 && p.y < 720.0);
    }
}

// ============================================================================
// Frame cycle
// ============================================================================

#[test]
fn test_field_is_stable_over_many_frames() {
    let mut host = FakeHost::new(1280.0, 720.0);
    let mut engine = Engine::new();
    engine.activate(&mut host);

    let mut canvas = RecordingCanvas::default();
    for frame in 1..=200 {
        assert!(engine.on_frame(&mut host, &mut canvas));
        assert_eq!(canvas.clears, frame);
        assert_eq!(canvas.circles.len(), PARTICLE_COUNT as usize);

        // Wrap keeps every disc inside the closed viewport bounds.
        for (center, _, _) in &canvas.circles {
            assert!(center.x >= 0.0 && center.x <= 1280.0);
            assert!(center.y >= 0.0 && center.y <= 720.0);
        }
    }
}

#[test]
fn test_lines_respect_the_threshold() {
    let mut host = FakeHost::new(1280.0, 720.0);
    let mut engine = Engine::new();
    engine.activate(&mut host);

    let mut canvas = RecordingCanvas::default();
    engine.on_frame(&mut host, &mut canvas);

    for (from, to, alpha) in &canvas.lines {
        let distance = from.distance(*to);
        assert!(distance < 100.0);
        assert!((alpha - (1.0 - distance / 100.0) * 0.2).abs() < 1e-5);
    }
    // The self-pairs alone guarantee one line per particle.
    assert!(canvas.lines.len() >= PARTICLE_COUNT as usize);
}

#[test]
fn test_frame_requests_chain_one_at_a_time() {
    let mut host = FakeHost::new(1280.0, 720.0);
    let mut engine = Engine::new();
    engine.activate(&mut host);

    let mut canvas = RecordingCanvas::default();
    for _ in 0..10 {
        engine.on_frame(&mut host, &mut canvas);
        assert_eq!(host.pending.len(), 1);
    }
}

// ============================================================================
// Deactivation
// ============================================================================

#[test]
fn test_deactivate_cancels_and_unsubscribes() {
    let mut host = FakeHost::new(1280.0, 720.0);
    let mut engine = Engine::new();
    engine.activate(&mut host);
    engine.deactivate(&mut host);

    assert_eq!(engine.state(), EngineState::Inactive);
    assert!(host.pending.is_empty());
    assert!(host.subscribed.is_empty());
    assert_eq!(host.cancel_calls, 1);
    assert_eq!(host.unsubscribe_calls, 1);
}

#[test]
fn test_double_deactivate_is_harmless() {
    let mut host = FakeHost::new(1280.0, 720.0);
    let mut engine = Engine::new();
    engine.activate(&mut host);
    engine.deactivate(&mut host);
    engine.deactivate(&mut host);

    // The second call found both handles already absent.
    assert_eq!(host.cancel_calls, 1);
    assert_eq!(host.unsubscribe_calls, 1);
    assert!(host.pending.is_empty());
}

#[test]
fn test_no_cycle_runs_after_deactivation() {
    let mut host = FakeHost::new(1280.0, 720.0);
    let mut engine = Engine::new();
    engine.activate(&mut host);
    engine.deactivate(&mut host);

    let mut canvas = RecordingCanvas::default();
    assert!(!engine.on_frame(&mut host, &mut canvas));
    assert_eq!(canvas.clears, 0);
    assert!(host.pending.is_empty());
}

// ============================================================================
// Resize and remount
// ============================================================================

#[test]
fn test_resize_changes_wrap_bounds_mid_run() {
    let mut host = FakeHost::new(200.0, 200.0);
    let mut engine = Engine::new();
    engine.activate(&mut host);

    let mut canvas = RecordingCanvas::default();
    engine.on_frame(&mut host, &mut canvas);

    host.size = (50.0, 50.0);
    engine.resize(&host);
    assert_eq!(engine.viewport(), Viewport::new(50.0, 50.0));

    // Particles beyond the shrunken bounds wrap on their next step.
    for _ in 0..2 {
        engine.on_frame(&mut host, &mut canvas);
    }
    for (center, _, _) in &canvas.circles {
        assert!(center.x <= 50.0);
        assert!(center.y <= 50.0);
    }
}

#[test]
fn test_remount_builds_a_fresh_field() {
    let mut host = FakeHost::new(1280.0, 720.0);
    let mut engine = Engine::new();

    engine.activate(&mut host);
    engine.deactivate(&mut host);
    engine.activate(&mut host);

    assert!(engine.is_active());
    assert_eq!(engine.particles().len(), PARTICLE_COUNT as usize);
    assert_eq!(host.subscribe_calls, 2);
    assert_eq!(host.unsubscribe_calls, 1);
    assert_eq!(host.pending.len(), 1);

    engine.deactivate(&mut host);
    assert_eq!(host.unsubscribe_calls, 2);
    assert!(host.subscribed.is_empty());
}
