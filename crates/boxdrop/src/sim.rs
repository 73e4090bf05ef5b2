//! The simulation context: world, spawn RNG and config in one place.
//!
//! A [`Simulation`] is created once, seeded with the three static
//! boundaries, and then mutated only by the two scheduled tasks:
//! [`Task::PhysicsStep`] and [`Task::Spawn`]. It is passed by `&mut` into
//! each task by the [`TickLoop`](crate::tick::TickLoop); nothing is global.

use std::ops::Range;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rapier2d::prelude::{Real, RigidBodyHandle};

use crate::config::{ConfigError, DemoConfig};
use crate::physics::{BodyKind, BoxSpec, PhysicsWorld};

/// Thickness of the floor and walls.
pub const BOUNDARY_THICKNESS: Real = 1.0;

/// Work items carried by the scheduler's timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Advance the world by one fixed step and request a repaint.
    PhysicsStep,
    /// Drop one new dynamic box from the top of the world.
    Spawn,
}

/// Horizontal spawn range for a world with the given half-extent:
/// `[-half_extent, half_extent / 2)`.
pub fn spawn_x_range(half_extent: Real) -> Range<Real> {
    -half_extent..half_extent / 2.0
}

/// Owns everything the scheduled tasks touch.
pub struct Simulation {
    world: PhysicsWorld,
    rng: Pcg64,
    config: DemoConfig,
    boundaries: [RigidBodyHandle; 3],
    spawned: Vec<RigidBodyHandle>,
}

impl Simulation {
    /// Validate `config`, build the world and add the floor and walls.
    pub fn new(config: DemoConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let [gx, gy] = config.gravity;
        let mut world = PhysicsWorld::new(gx, gy);
        let boundaries = seed_boundaries(&mut world, &config);
        let rng = match config.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_entropy(),
        };

        tracing::info!(
            world_size = config.world_size,
            seed = ?config.seed,
            "simulation initialized with {} boundary bodies",
            boundaries.len()
        );

        Ok(Self {
            world,
            rng,
            config,
            boundaries,
            spawned: Vec::new(),
        })
    }

    /// Run one scheduled task. Returns `true` when the display should be
    /// repainted.
    pub fn run_task(&mut self, task: Task) -> bool {
        match task {
            Task::PhysicsStep => {
                self.physics_tick();
                true
            }
            Task::Spawn => {
                self.spawn_tick();
                false
            }
        }
    }

    /// Advance the world by one fixed step.
    pub fn physics_tick(&mut self) {
        self.world.advance(
            self.config.fixed_dt(),
            self.config.velocity_iterations,
            self.config.position_iterations,
        );
        tracing::trace!(step = self.world.step_count(), "physics step");
    }

    /// Add one dynamic box at the top of the world with a random horizontal
    /// offset and rotation.
    pub fn spawn_tick(&mut self) -> RigidBodyHandle {
        let (x, angle) = self.next_spawn_pose();
        let spec = BoxSpec::new(
            BodyKind::Dynamic,
            x,
            self.config.world_size,
            self.config.spawn_width,
            self.config.spawn_height,
        )
        .with_angle(angle)
        .with_friction(self.config.friction)
        .with_restitution(self.config.restitution);

        let handle = self.world.add_box(&spec);
        self.spawned.push(handle);
        tracing::debug!(
            x,
            angle,
            bodies = self.world.body_count(),
            "spawned box #{}",
            self.spawned.len()
        );
        handle
    }

    /// Draw the next spawn offset and rotation from the RNG.
    fn next_spawn_pose(&mut self) -> (Real, Real) {
        let x = self.rng.gen_range(spawn_x_range(self.config.half_extent()));
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        (x, angle)
    }

    // -- accessors ----------------------------------------------------------

    /// Read-only access to the physics world.
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// The config this simulation was built from.
    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    /// Floor, left wall, right wall.
    pub fn boundaries(&self) -> [RigidBodyHandle; 3] {
        self.boundaries
    }

    /// Handles of every spawned box, oldest first.
    pub fn spawned(&self) -> &[RigidBodyHandle] {
        &self.spawned
    }
}

fn seed_boundaries(world: &mut PhysicsWorld, config: &DemoConfig) -> [RigidBodyHandle; 3] {
    let size = config.world_size;
    let half = config.half_extent();
    let boundary = |x, y, w, h| {
        BoxSpec::new(BodyKind::Static, x, y, w, h)
            .with_friction(config.friction)
            .with_restitution(config.restitution)
    };
    [
        world.add_box(&boundary(0.0, 0.0, size, BOUNDARY_THICKNESS)),
        world.add_box(&boundary(-half, half, BOUNDARY_THICKNESS, size)),
        world.add_box(&boundary(half, half, BOUNDARY_THICKNESS, size)),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
