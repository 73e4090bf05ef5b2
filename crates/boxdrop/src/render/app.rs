//! Windowed application runner.
//!
//! Provides [`run_windowed`], which builds a [`TickLoop`] from a
//! [`DemoConfig`] and drives it in real time inside a winit event loop.
//! The loop sleeps until the next timer occurrence is due
//! (`ControlFlow::WaitUntil`), runs every task that has come due, and
//! requests a redraw whenever a physics step ran. `RedrawRequested` paints
//! the current world through the [`DisplaySurface`].
//!
//! This module is feature-gated behind `renderer`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{WindowAttributes, WindowId};

use super::renderer::{DebugRenderer, FrameBuilder};
use crate::config::DemoConfig;
use crate::display::DisplaySurface;
use crate::tick::TickLoop;

/// Open a window and run the demo until it is closed.
///
/// # Errors
///
/// Returns an error if `config` is invalid, if the event loop cannot be
/// created, or if the window or renderer fail to initialize.
pub fn run_windowed(config: DemoConfig) -> Result<(), anyhow::Error> {
    let tick_loop = TickLoop::new(config.clone())?;
    let display = DisplaySurface::new(
        config.window_width,
        config.window_height,
        config.half_extent(),
        config.debug_draw,
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App {
        state: AppState::Pending { tick_loop, display },
        config,
        init_failed: false,
    };

    event_loop.run_app(&mut app)?;

    if app.init_failed {
        return Err(anyhow::anyhow!(
            "failed to initialize windowed renderer (see logs for details)"
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Internal state machine
// ---------------------------------------------------------------------------

/// Winit 0.30 requires that window creation happens inside the
/// `ApplicationHandler::resumed` callback, so the app starts `Pending` and
/// becomes `Running` once the window and renderer exist.
enum AppState {
    /// Waiting for `resumed` to create the window and renderer.
    Pending {
        tick_loop: TickLoop,
        display: DisplaySurface,
    },
    /// Window and renderer are initialized; timers are live.
    Running(Box<Running>),
    /// Temporary placeholder used during state transitions.
    Transitioning,
}

struct Running {
    tick_loop: TickLoop,
    display: DisplaySurface,
    renderer: DebugRenderer,
    frame: FrameBuilder,
    /// Wall-clock instant that the tick loop's zero maps to.
    started: Instant,
    max_lag: Duration,
}

impl Running {
    /// Run everything due by now and schedule the next wake-up.
    fn pump(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.started.elapsed();
        self.tick_loop.drop_missed_if_lagging(now, self.max_lag);
        let report = self.tick_loop.advance_to(now);
        if report.redraw_requested {
            self.renderer.window().request_redraw();
        }
        match self.tick_loop.next_due() {
            Some(due) => event_loop.set_control_flow(ControlFlow::WaitUntil(self.started + due)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.display
            .paint(self.tick_loop.simulation().world(), &mut self.frame);
        match self.renderer.render(&self.frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.renderer.window().inner_size();
                self.renderer.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("GPU out of memory -- exiting");
                event_loop.exit();
            }
            Err(e) => {
                tracing::warn!(error = %e, "surface error during render");
            }
        }
    }
}

/// The winit application handler that drives the tick loop with rendering.
struct App {
    state: AppState,
    config: DemoConfig,
    /// Set to `true` if initialization fails (window or renderer), so
    /// `run_windowed` can return an error after the event loop exits.
    init_failed: bool,
}

impl App {
    fn start(
        &self,
        event_loop: &ActiveEventLoop,
        tick_loop: TickLoop,
        display: DisplaySurface,
    ) -> Result<Running, anyhow::Error> {
        let (width, height) = display.size();
        let window_attrs = WindowAttributes::default()
            .with_title(self.config.window_title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(width, height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let renderer = pollster::block_on(DebugRenderer::new(window.clone()))?;

        let mut display = display;
        let size = window.inner_size();
        display.resize(size.width, size.height);

        tracing::info!(
            width = size.width,
            height = size.height,
            "window created; timers started"
        );
        window.request_redraw();

        Ok(Running {
            tick_loop,
            display,
            renderer,
            frame: FrameBuilder::new(),
            started: Instant::now(),
            max_lag: self.config.max_lag(),
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let state = std::mem::replace(&mut self.state, AppState::Transitioning);
        match state {
            AppState::Pending { tick_loop, display } => {
                match self.start(event_loop, tick_loop, display) {
                    Ok(running) => {
                        self.state = AppState::Running(Box::new(running));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to initialize window -- exiting");
                        self.init_failed = true;
                        event_loop.exit();
                    }
                }
            }
            running @ AppState::Running(_) => {
                self.state = running;
            }
            AppState::Transitioning => {
                tracing::warn!("resumed called during state transition");
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let AppState::Running(running) = &mut self.state else {
            // Not yet initialized; ignore window events.
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!(
                    physics_steps = running.tick_loop.physics_steps(),
                    boxes = running.tick_loop.simulation().spawned().len(),
                    "window close requested -- shutting down"
                );
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                running.renderer.resize(new_size);
                running.display.resize(new_size.width, new_size.height);
                running.renderer.window().request_redraw();
            }
            WindowEvent::RedrawRequested => running.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let AppState::Running(running) = &mut self.state {
            running.pump(event_loop);
        }
    }
}
