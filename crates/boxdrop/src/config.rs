//! Demo configuration.
//!
//! [`DemoConfig::default`] reproduces the stock demo: a 100 x 100 world under
//! earth gravity, a 60 Hz physics timer, one 5 x 5 box per second. Every
//! field is optional when deserializing; missing fields take the default.

use std::time::Duration;

use crate::draw::DebugDrawFlags;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while loading or validating a [`DemoConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The world extent must be positive and finite.
    #[error("world_size must be positive and finite, got {0}")]
    InvalidWorldSize(f32),

    /// A timer with a zero rate or period would never fire (or fire forever).
    #[error("{timer} timer must have a non-zero period")]
    ZeroPeriod {
        /// Which timer was misconfigured (`"physics"` or `"spawn"`).
        timer: &'static str,
    },

    /// Spawned boxes need a positive, finite size.
    #[error("spawn box size must be positive and finite, got {width} x {height}")]
    InvalidBoxSize {
        /// Configured box width.
        width: f32,
        /// Configured box height.
        height: f32,
    },

    /// Gravity components must be finite.
    #[error("gravity must be finite, got ({0}, {1})")]
    NonFiniteGravity(f32, f32),

    /// The JSON document could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// DemoConfig
// ---------------------------------------------------------------------------

/// Tunables for the box-drop demo.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Side length of the square world in meters. The floor sits at `y = 0`
    /// and the walls at `x = +-world_size / 2`.
    pub world_size: f32,
    /// Gravity vector in m/s^2.
    pub gravity: [f32; 2],
    /// Physics timer rate in Hz. The step length is `1 / physics_hz`.
    pub physics_hz: u32,
    /// Velocity solver iterations per step.
    pub velocity_iterations: usize,
    /// Position solver iterations per step.
    pub position_iterations: usize,
    /// Spawn timer period in milliseconds.
    pub spawn_period_ms: u64,
    /// Width of each spawned box.
    pub spawn_width: f32,
    /// Height of each spawned box.
    pub spawn_height: f32,
    /// Friction coefficient of spawned boxes and boundaries.
    pub friction: f32,
    /// Restitution coefficient of spawned boxes and boundaries.
    pub restitution: f32,
    /// Seed for the spawn RNG. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Initial window width in physical pixels.
    pub window_width: u32,
    /// Initial window height in physical pixels.
    pub window_height: u32,
    /// Window title.
    pub window_title: String,
    /// How far (in milliseconds) the windowed runner may fall behind its
    /// timers before missed occurrences are dropped.
    pub max_lag_ms: u64,
    /// Which elements the debug-draw pass reports.
    pub debug_draw: DebugDrawFlags,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            world_size: 100.0,
            gravity: [0.0, -9.81],
            physics_hz: 60,
            velocity_iterations: 6,
            position_iterations: 2,
            spawn_period_ms: 1000,
            spawn_width: 5.0,
            spawn_height: 5.0,
            friction: 0.8,
            restitution: 0.3,
            seed: None,
            window_width: 300,
            window_height: 300,
            window_title: "boxdrop".to_owned(),
            max_lag_ms: 250,
            debug_draw: DebugDrawFlags::default(),
        }
    }
}

impl DemoConfig {
    /// Parse a config from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any validation
    /// error from [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the config describes a runnable simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.world_size > 0.0 && self.world_size.is_finite()) {
            return Err(ConfigError::InvalidWorldSize(self.world_size));
        }
        // Rates above 1 GHz truncate to a zero-length period.
        if self.physics_hz == 0 || self.physics_period().is_zero() {
            return Err(ConfigError::ZeroPeriod { timer: "physics" });
        }
        if self.spawn_period_ms == 0 {
            return Err(ConfigError::ZeroPeriod { timer: "spawn" });
        }
        let size_ok = |v: f32| v > 0.0 && v.is_finite();
        if !size_ok(self.spawn_width) || !size_ok(self.spawn_height) {
            return Err(ConfigError::InvalidBoxSize {
                width: self.spawn_width,
                height: self.spawn_height,
            });
        }
        let [gx, gy] = self.gravity;
        if !gx.is_finite() || !gy.is_finite() {
            return Err(ConfigError::NonFiniteGravity(gx, gy));
        }
        Ok(())
    }

    /// Half of [`world_size`](Self::world_size).
    pub fn half_extent(&self) -> f32 {
        self.world_size / 2.0
    }

    /// Physics step length in seconds.
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.physics_hz as f32
    }

    /// Physics timer period.
    pub fn physics_period(&self) -> Duration {
        Duration::from_secs(1) / self.physics_hz
    }

    /// Spawn timer period.
    pub fn spawn_period(&self) -> Duration {
        Duration::from_millis(self.spawn_period_ms)
    }

    /// Maximum tolerated timer lag in the windowed runner.
    pub fn max_lag(&self) -> Duration {
        Duration::from_millis(self.max_lag_ms)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_demo_constants() {
        let config = DemoConfig::default();
        assert_eq!(config.world_size, 100.0);
        assert_eq!(config.half_extent(), 50.0);
        assert_eq!(config.gravity, [0.0, -9.81]);
        assert_eq!(config.velocity_iterations, 6);
        assert_eq!(config.position_iterations, 2);
        assert_eq!(config.spawn_period(), Duration::from_millis(1000));
        assert!((config.fixed_dt() - 1.0 / 60.0).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn physics_period_is_one_sixtieth_of_a_second() {
        let config = DemoConfig::default();
        let period = config.physics_period();
        assert_eq!(period, Duration::from_nanos(16_666_666));
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config = DemoConfig::from_json_str(r#"{ "seed": 7, "world_size": 40.0 }"#)
            .expect("valid config");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.world_size, 40.0);
        assert_eq!(config.physics_hz, 60);
        assert_eq!(config.window_title, "boxdrop");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = DemoConfig::from_json_str("{ world_size: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_physics_rate_is_rejected() {
        let config = DemoConfig {
            physics_hz: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ZeroPeriod { timer: "physics" }));
        assert_eq!(err.to_string(), "physics timer must have a non-zero period");
    }

    #[test]
    fn sub_nanosecond_physics_period_is_rejected() {
        let err = DemoConfig::from_json_str(r#"{ "physics_hz": 2000000000 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroPeriod { timer: "physics" }));

        let fastest = DemoConfig {
            physics_hz: 1_000_000_000,
            ..Default::default()
        };
        assert!(fastest.validate().is_ok());
        assert_eq!(fastest.physics_period(), Duration::from_nanos(1));
    }

    #[test]
    fn zero_spawn_period_is_rejected() {
        let err = DemoConfig::from_json_str(r#"{ "spawn_period_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroPeriod { timer: "spawn" }));
    }

    #[test]
    fn non_positive_world_size_is_rejected() {
        for size in [0.0, -10.0, f32::NAN, f32::INFINITY] {
            let config = DemoConfig {
                world_size: size,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidWorldSize(_))),
                "world_size {size} should be rejected"
            );
        }
    }

    #[test]
    fn degenerate_box_is_rejected() {
        let config = DemoConfig {
            spawn_width: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBoxSize { .. })
        ));
    }

    #[test]
    fn non_finite_gravity_is_rejected() {
        let config = DemoConfig {
            gravity: [0.0, f32::NEG_INFINITY],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFiniteGravity(_, _))
        ));
    }
}
