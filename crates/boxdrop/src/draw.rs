//! Debug-draw commands and the adapter that turns them into canvas calls.
//!
//! The physics world reports what it manages as a list of [`DrawCommand`]s
//! (see [`PhysicsWorld::debug_draw`](crate::physics::PhysicsWorld::debug_draw)).
//! [`RenderAdapter::draw`] is the single dispatch point that maps each
//! command onto a [`Canvas`]. Only polygons are drawn; circles, segments,
//! points and transform markers are accepted and skipped.
//!
//! Vertices are always in world space. The canvas owns the world-to-display
//! transform, set once per frame by the
//! [`DisplaySurface`](crate::display::DisplaySurface) before the draw pass.

use rapier2d::prelude::*;

use crate::view::ViewTransform;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// RGBA color, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque white, the canvas background.
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    /// An opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// The color as `[r, g, b, a]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

// ---------------------------------------------------------------------------
// DebugDrawFlags
// ---------------------------------------------------------------------------

/// Selects which elements the debug-draw pass reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DebugDrawFlags {
    /// Collider shapes (filled polygons, solid circles).
    pub shapes: bool,
    /// Collider bounding boxes (outlined polygons).
    pub aabbs: bool,
    /// One transform marker per body at its center of mass.
    pub center_of_mass: bool,
}

impl Default for DebugDrawFlags {
    fn default() -> Self {
        Self {
            shapes: true,
            aabbs: false,
            center_of_mass: false,
        }
    }
}

// ---------------------------------------------------------------------------
// DrawCommand
// ---------------------------------------------------------------------------

/// One primitive reported by the debug-draw pass. Coordinates are world space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Closed polygon outline, no fill.
    Outline {
        /// Vertices in order.
        vertices: Vec<Point<Real>>,
        /// Stroke color.
        color: Color,
    },
    /// Filled polygon, no outline.
    Fill {
        /// Vertices in order.
        vertices: Vec<Point<Real>>,
        /// Fill color.
        color: Color,
    },
    /// Circle outline.
    Circle {
        /// Center in world space.
        center: Point<Real>,
        /// Radius in world units.
        radius: Real,
        /// Stroke color.
        color: Color,
    },
    /// Filled circle with an orientation axis.
    SolidCircle {
        /// Center in world space.
        center: Point<Real>,
        /// Radius in world units.
        radius: Real,
        /// Unit vector along the body's local x axis.
        axis: Vector<Real>,
        /// Fill color.
        color: Color,
    },
    /// Line segment.
    Segment {
        /// First endpoint.
        a: Point<Real>,
        /// Second endpoint.
        b: Point<Real>,
        /// Stroke color.
        color: Color,
    },
    /// A single point.
    Point {
        /// Position in world space.
        at: Point<Real>,
        /// Diameter in device pixels.
        size: Real,
        /// Fill color.
        color: Color,
    },
    /// Body frame marker.
    Transform {
        /// Body center of mass in world space.
        origin: Point<Real>,
        /// Body rotation in radians.
        angle: Real,
    },
}

impl DrawCommand {
    /// Number of vertices carried by a polygon command, `None` otherwise.
    pub fn polygon_len(&self) -> Option<usize> {
        match self {
            DrawCommand::Outline { vertices, .. } | DrawCommand::Fill { vertices, .. } => {
                Some(vertices.len())
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// How a polygon is painted.
///
/// Strokes are cosmetic: one device pixel wide whatever the current scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolygonStyle {
    /// Outline only.
    Stroke(Color),
    /// Fill only.
    Fill(Color),
}

/// A 2D drawing surface.
///
/// Implemented by the wgpu renderer (feature `renderer`) and by
/// [`RecordingCanvas`] for headless runs.
pub trait Canvas {
    /// Discard everything drawn so far and fill the surface with `color`.
    fn clear(&mut self, color: Color);

    /// Set the world-to-display transform applied to subsequent polygons.
    fn set_transform(&mut self, transform: ViewTransform);

    /// Draw one closed polygon. `points` are in world space.
    fn draw_polygon(&mut self, points: &[Point<Real>], style: PolygonStyle);
}

// ---------------------------------------------------------------------------
// RenderAdapter
// ---------------------------------------------------------------------------

/// Per-frame counts kept by the [`RenderAdapter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Commands that produced a canvas call.
    pub drawn: usize,
    /// Commands accepted without output.
    pub skipped: usize,
}

/// Bridges debug-draw commands to a [`Canvas`].
#[derive(Debug, Default)]
pub struct RenderAdapter {
    stats: DrawStats,
}

impl RenderAdapter {
    /// Create an adapter with zeroed stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch one command. Returns `true` if a canvas call was issued.
    pub fn draw<C: Canvas + ?Sized>(&mut self, command: &DrawCommand, canvas: &mut C) -> bool {
        let drawn = match command {
            DrawCommand::Outline { vertices, color } => {
                canvas.draw_polygon(vertices, PolygonStyle::Stroke(*color));
                true
            }
            DrawCommand::Fill { vertices, color } => {
                canvas.draw_polygon(vertices, PolygonStyle::Fill(*color));
                true
            }
            DrawCommand::Circle { .. }
            | DrawCommand::SolidCircle { .. }
            | DrawCommand::Segment { .. }
            | DrawCommand::Point { .. }
            | DrawCommand::Transform { .. } => false,
        };
        if drawn {
            self.stats.drawn += 1;
        } else {
            self.stats.skipped += 1;
        }
        drawn
    }

    /// Counts since the last [`reset_stats`](Self::reset_stats).
    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    /// Zero the counters; called at the start of each frame.
    pub fn reset_stats(&mut self) {
        self.stats = DrawStats::default();
    }
}

// ---------------------------------------------------------------------------
// RecordingCanvas
// ---------------------------------------------------------------------------

/// A canvas call captured by [`RecordingCanvas`].
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasCall {
    Clear(Color),
    SetTransform(ViewTransform),
    Polygon {
        points: Vec<Point<Real>>,
        style: PolygonStyle,
    },
}

/// Headless canvas that records every call, in order.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    calls: Vec<CanvasCall>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call recorded so far. `clear` is recorded like any other call.
    pub fn calls(&self) -> &[CanvasCall] {
        &self.calls
    }

    /// Just the polygon calls.
    pub fn polygons(&self) -> impl Iterator<Item = (&[Point<Real>], PolygonStyle)> {
        self.calls.iter().filter_map(|call| match call {
            CanvasCall::Polygon { points, style } => Some((points.as_slice(), *style)),
            _ => None,
        })
    }
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self, color: Color) {
        self.calls.push(CanvasCall::Clear(color));
    }

    fn set_transform(&mut self, transform: ViewTransform) {
        self.calls.push(CanvasCall::SetTransform(transform));
    }

    fn draw_polygon(&mut self, points: &[Point<Real>], style: PolygonStyle) {
        self.calls.push(CanvasCall::Polygon {
            points: points.to_vec(),
            style,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Point<Real>> {
        vec![
            point![0.0, 0.0],
            point![1.0, 0.0],
            point![1.0, 1.0],
            point![0.0, 1.0],
        ]
    }

    #[test]
    fn fill_becomes_one_filled_polygon() {
        let mut adapter = RenderAdapter::new();
        let mut canvas = RecordingCanvas::new();
        let color = Color::rgb(0.9, 0.7, 0.7);

        let drawn = adapter.draw(
            &DrawCommand::Fill {
                vertices: unit_square(),
                color,
            },
            &mut canvas,
        );

        assert!(drawn);
        let polys: Vec<_> = canvas.polygons().collect();
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].0, unit_square().as_slice());
        assert_eq!(polys[0].1, PolygonStyle::Fill(color));
    }

    #[test]
    fn outline_becomes_one_stroked_polygon() {
        let mut adapter = RenderAdapter::new();
        let mut canvas = RecordingCanvas::new();
        let triangle = vec![point![0.0, 0.0], point![2.0, 0.0], point![1.0, 3.0]];

        adapter.draw(
            &DrawCommand::Outline {
                vertices: triangle.clone(),
                color: Color::WHITE,
            },
            &mut canvas,
        );

        let polys: Vec<_> = canvas.polygons().collect();
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].0.len(), 3);
        assert_eq!(polys[0].1, PolygonStyle::Stroke(Color::WHITE));
    }

    #[test]
    fn non_polygon_commands_are_skipped() {
        let mut adapter = RenderAdapter::new();
        let mut canvas = RecordingCanvas::new();
        let c = Color::rgb(0.1, 0.2, 0.3);
        let skipped = [
            DrawCommand::Circle {
                center: point![0.0, 0.0],
                radius: 1.0,
                color: c,
            },
            DrawCommand::SolidCircle {
                center: point![0.0, 0.0],
                radius: 1.0,
                axis: vector![1.0, 0.0],
                color: c,
            },
            DrawCommand::Segment {
                a: point![0.0, 0.0],
                b: point![1.0, 1.0],
                color: c,
            },
            DrawCommand::Point {
                at: point![0.0, 0.0],
                size: 2.0,
                color: c,
            },
            DrawCommand::Transform {
                origin: point![0.0, 0.0],
                angle: 0.5,
            },
        ];

        for cmd in &skipped {
            assert!(!adapter.draw(cmd, &mut canvas));
        }
        assert!(canvas.calls().is_empty());
        assert_eq!(
            adapter.stats(),
            DrawStats {
                drawn: 0,
                skipped: 5
            }
        );
    }

    #[test]
    fn stats_reset_between_frames() {
        let mut adapter = RenderAdapter::new();
        let mut canvas = RecordingCanvas::new();
        adapter.draw(
            &DrawCommand::Fill {
                vertices: unit_square(),
                color: Color::WHITE,
            },
            &mut canvas,
        );
        assert_eq!(adapter.stats().drawn, 1);
        adapter.reset_stats();
        assert_eq!(adapter.stats(), DrawStats::default());
    }

    #[test]
    fn polygon_len_reports_vertex_count() {
        let fill = DrawCommand::Fill {
            vertices: unit_square(),
            color: Color::WHITE,
        };
        assert_eq!(fill.polygon_len(), Some(4));
        let marker = DrawCommand::Transform {
            origin: point![0.0, 0.0],
            angle: 0.0,
        };
        assert_eq!(marker.polygon_len(), None);
    }

    #[test]
    fn color_array_order_is_rgba() {
        let c = Color {
            r: 0.1,
            g: 0.2,
            b: 0.3,
            a: 0.4,
        };
        assert_eq!(c.to_array(), [0.1, 0.2, 0.3, 0.4]);
    }
}
