//! rapier2d world, box factory and debug-draw pass.
//!
//! [`PhysicsWorld`] owns every rapier set. Bodies enter through
//! [`PhysicsWorld::add_box`] and are never removed. Each physics tick calls
//! [`PhysicsWorld::advance`] with the fixed step; each repaint calls
//! [`PhysicsWorld::debug_draw`], which reports the managed shapes as
//! [`DrawCommand`]s.
//!
//! # Determinism
//!
//! rapier2d is compiled with `enhanced-determinism`. With a fixed step and a
//! seeded spawn RNG, two runs produce identical poses. Snapshots and draw
//! commands are emitted in arena order, which is insertion order here since
//! nothing is ever removed.

use std::num::NonZeroUsize;

use rapier2d::prelude::*;

use crate::draw::{Color, DebugDrawFlags, DrawCommand};

/// Density of every box collider, in kg/m^2.
pub const DENSITY: Real = 10.0;

/// Default friction coefficient for [`BoxSpec`].
pub const DEFAULT_FRICTION: Real = 0.8;

/// Default restitution coefficient for [`BoxSpec`].
pub const DEFAULT_RESTITUTION: Real = 0.3;

// ---------------------------------------------------------------------------
// Debug-draw palette
// ---------------------------------------------------------------------------

const COLOR_STATIC: Color = Color::rgb(0.5, 0.9, 0.5);
const COLOR_KINEMATIC: Color = Color::rgb(0.5, 0.5, 0.9);
const COLOR_SLEEPING: Color = Color::rgb(0.6, 0.6, 0.6);
const COLOR_AWAKE: Color = Color::rgb(0.9, 0.7, 0.7);
const COLOR_DISABLED: Color = Color::rgb(0.5, 0.5, 0.3);
const COLOR_AABB: Color = Color::rgb(0.9, 0.3, 0.9);

// ---------------------------------------------------------------------------
// Body descriptors
// ---------------------------------------------------------------------------

/// How the solver treats a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BodyKind {
    /// Immovable (e.g., walls and floor).
    Static,
    /// Moved by velocity only, ignores forces.
    Kinematic,
    /// Fully simulated: gravity and contacts.
    Dynamic,
}

impl BodyKind {
    fn from_rapier(body_type: RigidBodyType) -> Self {
        match body_type {
            RigidBodyType::Fixed => BodyKind::Static,
            RigidBodyType::Dynamic => BodyKind::Dynamic,
            RigidBodyType::KinematicPositionBased | RigidBodyType::KinematicVelocityBased => {
                BodyKind::Kinematic
            }
        }
    }
}

/// A rectangle to insert into the world.
///
/// `width` and `height` are full extents before rotation. Nothing is
/// validated: negative sizes or out-of-world centers are the caller's
/// business.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpec {
    pub kind: BodyKind,
    pub center_x: Real,
    pub center_y: Real,
    pub width: Real,
    pub height: Real,
    /// Rotation in radians, counter-clockwise.
    pub angle: Real,
    pub friction: Real,
    pub restitution: Real,
}

impl BoxSpec {
    /// An unrotated box with the default material.
    pub fn new(kind: BodyKind, center_x: Real, center_y: Real, width: Real, height: Real) -> Self {
        Self {
            kind,
            center_x,
            center_y,
            width,
            height,
            angle: 0.0,
            friction: DEFAULT_FRICTION,
            restitution: DEFAULT_RESTITUTION,
        }
    }

    pub fn with_angle(mut self, angle: Real) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_friction(mut self, friction: Real) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_restitution(mut self, restitution: Real) -> Self {
        self.restitution = restitution;
        self
    }
}

/// Material of the first collider attached to a body.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Material {
    pub friction: Real,
    pub restitution: Real,
    pub density: Real,
}

/// Read-only view of one body after the latest step.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BodySnapshot {
    /// Arena index of the body; stable for the life of the world.
    pub id: u32,
    pub kind: BodyKind,
    pub x: Real,
    pub y: Real,
    /// Rotation in radians.
    pub angle: Real,
    pub vx: Real,
    pub vy: Real,
    pub angvel: Real,
    pub mass: Real,
    pub sleeping: bool,
    pub material: Option<Material>,
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Owns the rapier2d simulation state.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    steps: u64,
}

impl PhysicsWorld {
    /// Create an empty world with the given gravity vector.
    pub fn new(gravity_x: Real, gravity_y: Real) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![gravity_x, gravity_y],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            steps: 0,
        }
    }

    /// Insert one box body with a single cuboid collider of density
    /// [`DENSITY`].
    pub fn add_box(&mut self, spec: &BoxSpec) -> RigidBodyHandle {
        let builder = match spec.kind {
            BodyKind::Static => RigidBodyBuilder::fixed(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
        };
        let rb = builder
            .translation(vector![spec.center_x, spec.center_y])
            .rotation(spec.angle)
            .build();
        let body_handle = self.rigid_body_set.insert(rb);

        let collider = ColliderBuilder::cuboid(spec.width / 2.0, spec.height / 2.0)
            .density(DENSITY)
            .friction(spec.friction)
            .restitution(spec.restitution)
            .build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        tracing::trace!(
            kind = ?spec.kind,
            x = spec.center_x,
            y = spec.center_y,
            w = spec.width,
            h = spec.height,
            "box added"
        );
        body_handle
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// `velocity_iterations` drives rapier's solver iterations (at least
    /// one); `position_iterations` drives its internal PGS iterations (also
    /// at least one). Expected to be called at a fixed cadence; irregular
    /// `dt` is not rejected.
    pub fn advance(&mut self, dt: Real, velocity_iterations: usize, position_iterations: usize) {
        self.integration_params.dt = dt;
        self.integration_params.num_solver_iterations =
            NonZeroUsize::new(velocity_iterations).unwrap_or(NonZeroUsize::MIN);
        self.integration_params.num_internal_pgs_iterations = position_iterations.max(1);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None, // query pipeline (unused)
            &(),  // physics hooks
            &(),  // event handler
        );
        self.steps += 1;
    }

    /// Report the shapes this world manages.
    ///
    /// Cuboids and convex polygons become [`DrawCommand::Fill`] with their
    /// world-space corners, balls become [`DrawCommand::SolidCircle`],
    /// segments [`DrawCommand::Segment`]. Bounding boxes and center-of-mass
    /// markers are added when enabled in `flags`.
    pub fn debug_draw(&self, flags: DebugDrawFlags) -> Vec<DrawCommand> {
        let mut commands = Vec::with_capacity(self.collider_set.len());

        if flags.shapes {
            for (_, collider) in self.collider_set.iter() {
                let color = self.collider_color(collider);
                let pos = collider.position();
                let shape = collider.shape();

                if let Some(cuboid) = shape.as_cuboid() {
                    let he = cuboid.half_extents;
                    let vertices = [
                        point![-he.x, -he.y],
                        point![he.x, -he.y],
                        point![he.x, he.y],
                        point![-he.x, he.y],
                    ]
                    .into_iter()
                    .map(|p| pos * p)
                    .collect();
                    commands.push(DrawCommand::Fill { vertices, color });
                } else if let Some(poly) = shape.as_convex_polygon() {
                    let vertices = poly.points().iter().map(|p| pos * p).collect();
                    commands.push(DrawCommand::Fill { vertices, color });
                } else if let Some(ball) = shape.as_ball() {
                    commands.push(DrawCommand::SolidCircle {
                        center: Point::from(pos.translation.vector),
                        radius: ball.radius,
                        axis: pos.rotation * vector![1.0, 0.0],
                        color,
                    });
                } else if let Some(segment) = shape.as_segment() {
                    commands.push(DrawCommand::Segment {
                        a: pos * segment.a,
                        b: pos * segment.b,
                        color,
                    });
                }
            }
        }

        if flags.aabbs {
            for (_, collider) in self.collider_set.iter() {
                let aabb = collider.compute_aabb();
                let (lo, hi) = (aabb.mins, aabb.maxs);
                commands.push(DrawCommand::Outline {
                    vertices: vec![lo, point![hi.x, lo.y], hi, point![lo.x, hi.y]],
                    color: COLOR_AABB,
                });
            }
        }

        if flags.center_of_mass {
            for (_, rb) in self.rigid_body_set.iter() {
                commands.push(DrawCommand::Transform {
                    origin: *rb.center_of_mass(),
                    angle: rb.rotation().angle(),
                });
            }
        }

        commands
    }

    fn collider_color(&self, collider: &Collider) -> Color {
        let Some(rb) = collider.parent().and_then(|h| self.rigid_body_set.get(h)) else {
            return COLOR_STATIC;
        };
        if !collider.is_enabled() || !rb.is_enabled() {
            COLOR_DISABLED
        } else if rb.is_fixed() {
            COLOR_STATIC
        } else if rb.is_kinematic() {
            COLOR_KINEMATIC
        } else if rb.is_sleeping() {
            COLOR_SLEEPING
        } else {
            COLOR_AWAKE
        }
    }

    /// Snapshot one body, if the handle is live.
    pub fn body(&self, handle: RigidBodyHandle) -> Option<BodySnapshot> {
        self.rigid_body_set
            .get(handle)
            .map(|rb| self.snapshot(handle, rb))
    }

    /// Snapshot every body, in insertion order.
    pub fn bodies(&self) -> Vec<BodySnapshot> {
        self.rigid_body_set
            .iter()
            .map(|(handle, rb)| self.snapshot(handle, rb))
            .collect()
    }

    fn snapshot(&self, handle: RigidBodyHandle, rb: &RigidBody) -> BodySnapshot {
        let material = rb
            .colliders()
            .first()
            .and_then(|h| self.collider_set.get(*h))
            .map(|c| Material {
                friction: c.friction(),
                restitution: c.restitution(),
                density: c.density(),
            });
        let trans = rb.translation();
        let vel = rb.linvel();
        BodySnapshot {
            id: handle.into_raw_parts().0,
            kind: BodyKind::from_rapier(rb.body_type()),
            x: trans.x,
            y: trans.y,
            angle: rb.rotation().angle(),
            vx: vel.x,
            vy: vel.y,
            angvel: rb.angvel(),
            mass: rb.mass(),
            sleeping: rb.is_sleeping(),
            material,
        }
    }

    /// Number of bodies in the world.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Number of bodies of the given kind.
    pub fn count_of(&self, kind: BodyKind) -> usize {
        self.rigid_body_set
            .iter()
            .filter(|(_, rb)| BodyKind::from_rapier(rb.body_type()) == kind)
            .count()
    }

    /// Number of [`advance`](Self::advance) calls so far.
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// The gravity vector.
    pub fn gravity(&self) -> Vector<Real> {
        self.gravity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
