//! End-to-end tests: timers, spawning, boundaries and painting together.
//!
//! Every test drives the tick loop with exact instants, so nothing here
//! depends on wall-clock time.

use std::time::Duration;

use boxdrop::prelude::*;
use rapier2d::prelude::{Point, Real};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn seeded_loop(seed: u64) -> TickLoop {
    TickLoop::new(DemoConfig {
        seed: Some(seed),
        ..Default::default()
    })
    .expect("default config is valid")
}

/// Lengths of the first two edges of a quad.
fn edge_lengths(points: &[Point<Real>]) -> (Real, Real) {
    ((points[1] - points[0]).norm(), (points[2] - points[1]).norm())
}

fn is_spawned_box(points: &[Point<Real>]) -> bool {
    let (a, b) = edge_lengths(points);
    (a - 5.0).abs() < 1e-3 && (b - 5.0).abs() < 1e-3
}

// -- Spawning ---------------------------------------------------------------

#[test]
fn one_box_per_second() {
    let mut tick_loop = seeded_loop(1);
    let dynamic = |t: &TickLoop| t.simulation().world().count_of(BodyKind::Dynamic);

    assert_eq!(dynamic(&tick_loop), 0);

    tick_loop.advance_to(ms(999));
    assert_eq!(dynamic(&tick_loop), 0);

    tick_loop.advance_to(ms(1000));
    assert_eq!(dynamic(&tick_loop), 1);

    tick_loop.advance_to(ms(1999));
    assert_eq!(dynamic(&tick_loop), 1);

    tick_loop.advance_to(ms(2000));
    assert_eq!(dynamic(&tick_loop), 2);
    assert_eq!(tick_loop.simulation().world().body_count(), 5);
}

#[test]
fn spawned_boxes_paint_as_five_by_five_quads() {
    let mut tick_loop = seeded_loop(2);
    tick_loop.advance_to(ms(2000));

    let mut surface = DisplaySurface::new(300, 300, 50.0, DebugDrawFlags::default());
    let mut canvas = RecordingCanvas::new();
    let stats = surface.paint(tick_loop.simulation().world(), &mut canvas);

    assert_eq!(stats.drawn, 5);
    let polygons: Vec<_> = canvas.polygons().collect();
    assert_eq!(polygons.len(), 5);
    for (points, style) in &polygons {
        assert_eq!(points.len(), 4);
        assert!(matches!(style, PolygonStyle::Fill(_)));
    }
    let boxes = polygons.iter().filter(|(p, _)| is_spawned_box(p)).count();
    assert_eq!(boxes, 2);
}

#[test]
fn spawns_start_at_the_top_inside_the_spawn_range() {
    let mut tick_loop = seeded_loop(3);
    let range = spawn_x_range(50.0);

    for second in 1..=20u64 {
        tick_loop.advance_to(Duration::from_secs(second));
        let newest = *tick_loop
            .simulation()
            .spawned()
            .last()
            .expect("a box per second");
        let body = tick_loop
            .simulation()
            .world()
            .body(newest)
            .expect("spawned body exists");
        // Spawned at this instant, so not yet stepped.
        assert_eq!(body.y, 100.0);
        assert!(range.contains(&body.x), "x = {} outside {:?}", body.x, range);
    }
}

#[test]
fn same_seed_replays_identically() {
    let run = |seed| {
        let mut tick_loop = seeded_loop(seed);
        tick_loop.advance_to(ms(5000));
        tick_loop
            .simulation()
            .world()
            .bodies()
            .into_iter()
            .map(|b| (b.x, b.y, b.angle))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(99), run(99));
}

// -- Boundaries -------------------------------------------------------------

#[test]
fn boundaries_stay_put_under_a_pile_of_boxes() {
    let mut tick_loop = seeded_loop(4);
    let boundaries = tick_loop.simulation().boundaries();
    let before: Vec<_> = boundaries
        .iter()
        .map(|h| tick_loop.simulation().world().body(*h).expect("boundary"))
        .collect();

    // Enough time for the first boxes to land and stack.
    tick_loop.advance_to(Duration::from_secs(15));

    let world = tick_loop.simulation().world();
    assert_eq!(world.count_of(BodyKind::Static), 3);
    for (handle, initial) in boundaries.iter().zip(&before) {
        let now = world.body(*handle).expect("boundary");
        assert_eq!(now.kind, BodyKind::Static);
        assert_eq!((now.x, now.y, now.angle), (initial.x, initial.y, initial.angle));
        assert_eq!((now.vx, now.vy, now.angvel), (0.0, 0.0, 0.0));
    }
}

// -- Free fall --------------------------------------------------------------

#[test]
fn free_fall_speeds_up_every_step() {
    let config = DemoConfig::default();
    let mut world = PhysicsWorld::new(config.gravity[0], config.gravity[1]);
    let handle = world.add_box(&BoxSpec::new(BodyKind::Dynamic, 0.0, 100.0, 5.0, 5.0));

    let mut last_vy = 0.0;
    // Two seconds of fall covers about 20 units, well clear of anything.
    for step in 0..120 {
        world.advance(
            config.fixed_dt(),
            config.velocity_iterations,
            config.position_iterations,
        );
        let body = world.body(handle).expect("falling body");
        assert!(
            body.vy < last_vy,
            "step {step}: vy {} did not decrease from {last_vy}",
            body.vy
        );
        last_vy = body.vy;
    }
    assert!((last_vy + 9.81 * 2.0).abs() < 0.1, "vy after 2 s = {last_vy}");
}

// -- Configuration ----------------------------------------------------------

#[test]
fn json_config_drives_the_loop() {
    let config = DemoConfig::from_json_str(r#"{ "spawn_period_ms": 250, "seed": 8 }"#)
        .expect("valid json config");
    let mut tick_loop = TickLoop::new(config).expect("valid config");

    let report = tick_loop.advance_to(ms(1000));
    assert_eq!(report.spawns, 4);
    assert_eq!(report.physics_steps, 60);
}

#[test]
fn zero_spawn_period_is_rejected() {
    let err = DemoConfig::from_json_str(r#"{ "spawn_period_ms": 0 }"#)
        .expect_err("zero period must fail");
    assert!(matches!(err, ConfigError::ZeroPeriod { timer: "spawn" }), "{err}");
}
