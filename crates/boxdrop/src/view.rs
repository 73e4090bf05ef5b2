//! World-space to display-space mapping.
//!
//! World space is y-up with the origin at the center of the floor. Display
//! space is in pixels, origin top-left, y-down. The [`ViewTransform`] scales
//! uniformly so the full world width fits the display width, and places the
//! world origin at the bottom-center of the display. Display height never
//! affects the scale, only where the origin lands vertically.

use rapier2d::prelude::*;

/// Uniform scale + translation from world space to display space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Pixels per world unit.
    pub scale: Real,
    /// Display x of the world origin.
    pub origin_x: Real,
    /// Display y of the world origin.
    pub origin_y: Real,
}

impl ViewTransform {
    /// Build the transform for a display of `width` x `height` pixels showing
    /// a world whose horizontal half-extent is `half_extent`.
    ///
    /// Widths below one pixel are treated as one pixel so the transform
    /// stays invertible while a window is minimized.
    pub fn for_display(width: Real, height: Real, half_extent: Real) -> Self {
        let half_width = width.max(1.0) / 2.0;
        Self {
            scale: half_width / half_extent,
            origin_x: half_width,
            origin_y: height,
        }
    }

    /// Map a world-space point to display pixels.
    pub fn to_display(&self, p: Point<Real>) -> Point<Real> {
        point![
            self.origin_x + p.x * self.scale,
            self.origin_y - p.y * self.scale
        ]
    }

    /// Map a display pixel back to world space.
    pub fn to_world(&self, p: Point<Real>) -> Point<Real> {
        point![
            (p.x - self.origin_x) / self.scale,
            (self.origin_y - p.y) / self.scale
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_origin_lands_at_bottom_center() {
        let t = ViewTransform::for_display(300.0, 300.0, 50.0);
        let p = t.to_display(point![0.0, 0.0]);
        assert_eq!(p, point![150.0, 300.0]);
    }

    #[test]
    fn walls_touch_the_display_edges() {
        let t = ViewTransform::for_display(300.0, 300.0, 50.0);
        assert_eq!(t.to_display(point![-50.0, 0.0]).x, 0.0);
        assert_eq!(t.to_display(point![50.0, 0.0]).x, 300.0);
    }

    #[test]
    fn y_axis_is_flipped() {
        let t = ViewTransform::for_display(300.0, 300.0, 50.0);
        let high = t.to_display(point![0.0, 100.0]);
        let low = t.to_display(point![0.0, 10.0]);
        assert!(high.y < low.y, "higher world y must be nearer the top");
        assert_eq!(high.y, 0.0);
    }

    #[test]
    fn height_only_moves_the_origin() {
        let short = ViewTransform::for_display(400.0, 200.0, 50.0);
        let tall = ViewTransform::for_display(400.0, 800.0, 50.0);
        assert_eq!(short.scale, tall.scale);
        assert_eq!(short.origin_x, tall.origin_x);
        assert_eq!(short.origin_y, 200.0);
        assert_eq!(tall.origin_y, 800.0);
    }

    #[test]
    fn zero_width_display_stays_invertible() {
        let t = ViewTransform::for_display(0.0, 100.0, 50.0);
        assert!(t.scale > 0.0);
        let back = t.to_world(t.to_display(point![3.0, 4.0]));
        assert!((back.x - 3.0).abs() < 1e-4 && (back.y - 4.0).abs() < 1e-4);
    }
}
