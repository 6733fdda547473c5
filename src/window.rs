//! Windowed host: mounts the engine into a winit window with the GPU canvas.
//!
//! This is the production counterpart of the fake host the tests drive. The
//! winit event loop supplies both host services: `request_redraw` is the
//! per-frame continuation primitive and `WindowEvent::Resized` the resize
//! notification source.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::engine::{Engine, FrameRequest, Host, ResizeSubscription};
use crate::gpu::GpuCanvas;

/// Host implementation backed by a winit window.
///
/// winit cannot un-request a redraw, so `cancel_frame` only forgets the
/// token; the engine side of the contract (a fired callback with no pending
/// token does nothing) is what actually stops a cancelled frame.
struct WindowHost {
    window: Arc<Window>,
    next_token: u64,
    resize_subscribed: bool,
}

impl WindowHost {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_token: 0,
            resize_subscribed: false,
        }
    }
}

impl Host for WindowHost {
    fn request_frame(&mut self) -> FrameRequest {
        self.window.request_redraw();
        self.next_token += 1;
        FrameRequest(self.next_token)
    }

    fn cancel_frame(&mut self, _request: FrameRequest) {}

    fn subscribe_resize(&mut self) -> ResizeSubscription {
        self.resize_subscribed = true;
        self.next_token += 1;
        ResizeSubscription(self.next_token)
    }

    fn unsubscribe_resize(&mut self, _subscription: ResizeSubscription) {
        self.resize_subscribed = false;
    }

    fn surface_size(&self) -> (f32, f32) {
        let size = self.window.inner_size();
        (size.width as f32, size.height as f32)
    }
}

/// Application state for the drift-field window.
pub struct App {
    window: Option<Arc<Window>>,
    host: Option<WindowHost>,
    canvas: Option<GpuCanvas>,
    engine: Engine,
}

impl App {
    pub fn new() -> Self {
        Self {
            window: None,
            host: None,
            canvas: None,
            engine: Engine::new(),
        }
    }

    /// Acquire the drawable context and mount the engine.
    ///
    /// A failed acquisition is not an error: the window stays blank and the
    /// engine stays inert for this activation.
    fn mount(&mut self, window: Arc<Window>) {
        match pollster::block_on(GpuCanvas::new(window.clone())) {
            Ok(canvas) => {
                let mut host = WindowHost::new(window);
                self.engine.activate(&mut host);
                self.canvas = Some(canvas);
                self.host = Some(host);
            }
            Err(e) => {
                log::warn!("no drawable context, running without a backdrop: {}", e);
            }
        }
    }

    fn unmount(&mut self) {
        if let Some(host) = &mut self.host {
            self.engine.deactivate(host);
        }
        self.canvas = None;
        self.host = None;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title("driftfield")
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

            match event_loop.create_window(window_attrs) {
                Ok(window) => self.window = Some(Arc::new(window)),
                Err(e) => {
                    log::error!("failed to create window: {}", e);
                    event_loop.exit();
                    return;
                }
            }
        }

        if self.canvas.is_none() {
            if let Some(window) = self.window.clone() {
                self.mount(window);
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        // The surface does not survive suspension; release everything and
        // remount on the next resume.
        self.unmount();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.unmount();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let (Some(host), Some(canvas)) = (self.host.as_mut(), self.canvas.as_mut()) {
                    canvas.resize(physical_size);
                    if host.resize_subscribed {
                        self.engine.resize(host);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let (Some(host), Some(canvas)) = (self.host.as_mut(), self.canvas.as_mut()) {
                    if self.engine.on_frame(host, canvas) {
                        match canvas.present() {
                            Ok(()) => {}
                            Err(wgpu::SurfaceError::Lost) => {
                                canvas.resize(host.window.inner_size());
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("out of GPU memory, shutting down");
                                event_loop.exit();
                            }
                            Err(e) => log::error!("render error: {:?}", e),
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open a window and run the drift field until the window closes.
pub fn run() -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)
}
