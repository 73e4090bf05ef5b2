//! boxdrop -- boxes falling into a walled rapier2d world.
//!
//! A 100 x 100 world with a floor and two walls. Every second a 5 x 5 box is
//! dropped from the top at a random offset and rotation; sixty times a second
//! the world steps and the window is repainted from a debug-draw pass.
//!
//! The crate splits that into:
//!
//! - [`physics`]: the rapier world, the box factory and the debug-draw pass.
//! - [`draw`]: draw commands, the [`Canvas`](draw::Canvas) seam and the
//!   adapter between them.
//! - [`view`] and [`display`]: world-to-pixel transform and per-frame paint.
//! - [`schedule`], [`sim`] and [`tick`]: timers, the simulation context and
//!   the loop that ties them together.
//! - `render` (feature `renderer`): wgpu canvas and the winit runner.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//! use boxdrop::prelude::*;
//!
//! let config = DemoConfig { seed: Some(7), ..Default::default() };
//! let mut tick_loop = TickLoop::new(config).expect("valid config");
//! tick_loop.advance_to(Duration::from_secs(1));
//!
//! let mut surface = DisplaySurface::new(300, 300, 50.0, DebugDrawFlags::default());
//! let mut canvas = RecordingCanvas::new();
//! let stats = surface.paint(tick_loop.simulation().world(), &mut canvas);
//! // Floor, two walls, one falling box.
//! assert_eq!(stats.drawn, 4);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod display;
pub mod draw;
pub mod physics;
pub mod render;
pub mod schedule;
pub mod sim;
pub mod tick;
pub mod view;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::{ConfigError, DemoConfig};
    pub use crate::display::DisplaySurface;
    pub use crate::draw::{
        Canvas, CanvasCall, Color, DebugDrawFlags, DrawCommand, DrawStats, PolygonStyle,
        RecordingCanvas, RenderAdapter,
    };
    pub use crate::physics::{BodyKind, BodySnapshot, BoxSpec, Material, PhysicsWorld};
    pub use crate::schedule::{Scheduler, TimerId};
    pub use crate::sim::{spawn_x_range, Simulation, Task};
    pub use crate::tick::{TickDiagnostics, TickLoop, TickReport};
    pub use crate::view::ViewTransform;
}
