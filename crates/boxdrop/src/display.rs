//! The paintable surface: canvas size, view transform and the per-frame
//! draw pass.

use rapier2d::prelude::Real;

use crate::draw::{Canvas, Color, DebugDrawFlags, DrawStats, RenderAdapter};
use crate::physics::PhysicsWorld;
use crate::view::ViewTransform;

/// Background color of every frame.
pub const BACKGROUND: Color = Color::WHITE;

/// Owns the display size and the world-to-display transform.
///
/// Every [`paint`](Self::paint) redraws from scratch: clear, set transform,
/// then one adapter dispatch per command reported by the world.
#[derive(Debug)]
pub struct DisplaySurface {
    width: u32,
    height: u32,
    half_extent: Real,
    transform: ViewTransform,
    flags: DebugDrawFlags,
    adapter: RenderAdapter,
}

impl DisplaySurface {
    /// A surface of `width` x `height` pixels showing a world with the given
    /// horizontal half-extent.
    pub fn new(width: u32, height: u32, half_extent: Real, flags: DebugDrawFlags) -> Self {
        Self {
            width,
            height,
            half_extent,
            transform: ViewTransform::for_display(width as Real, height as Real, half_extent),
            flags,
            adapter: RenderAdapter::new(),
        }
    }

    /// Recompute the transform for a new display size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.transform =
            ViewTransform::for_display(width as Real, height as Real, self.half_extent);
        tracing::debug!(width, height, scale = self.transform.scale, "display resized");
    }

    /// Draw one frame of `world` onto `canvas`.
    pub fn paint<C: Canvas + ?Sized>(&mut self, world: &PhysicsWorld, canvas: &mut C) -> DrawStats {
        self.adapter.reset_stats();
        canvas.clear(BACKGROUND);
        canvas.set_transform(self.transform);
        for command in world.debug_draw(self.flags) {
            self.adapter.draw(&command, canvas);
        }
        self.adapter.stats()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }
}
