//! Windowed front end: a wgpu canvas and the winit event loop that drives
//! the tick loop in real time.
//!
//! This module is feature-gated behind `renderer`. When the feature is not
//! enabled, this module compiles to nothing and the crate stays headless;
//! [`RecordingCanvas`](crate::draw::RecordingCanvas) covers painting in
//! that case.

#[cfg(feature = "renderer")]
pub mod app;
#[cfg(feature = "renderer")]
pub mod renderer;

#[cfg(feature = "renderer")]
pub use app::run_windowed;
#[cfg(feature = "renderer")]
pub use renderer::{DebugRenderer, FrameBuilder, Vertex};
