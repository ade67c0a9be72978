//! Robot configuration.
//!
//! Loaded from `robot.toml` via the shared [`ConfigLoader`]. Every field
//! has a workable default so a bare file still produces a drivable robot;
//! `validate` rejects combinations the control code would otherwise have
//! to refuse at runtime.
//!
//! ```toml
//! [tick]
//! period_ms = 20
//!
//! [drive]
//! style = "arcade"
//! left_inverted = false
//! right_inverted = true
//! counts_per_unit = 100.0
//! max_encoder_speed = 1000.0
//! max_rotation_output = 0.7
//!
//! [drive.speed_pid]
//! kp = 0.4
//! ki = 0.02
//!
//! [drive.heading_pid]
//! kp = 0.015
//! ki = 0.001
//! ```

use serde::Deserialize;

use tiller_common::config::ConfigError;
use tiller_control::LoopGains;
use tiller_control::mixer::DriveMixer;

/// Teleop stick-to-wheel mixing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DriveStyle {
    /// Left stick speed, right stick rotation.
    #[default]
    Arcade,
    /// One stick for both speed and rotation.
    SingleStick,
    /// One stick per side.
    Tank,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PidConfig {
    #[serde(default)]
    pub kp: f64,
    #[serde(default)]
    pub ki: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self { kp: 0.0, ki: 0.0 }
    }
}

impl PidConfig {
    pub fn gains(&self) -> LoopGains {
        LoopGains::new(self.kp, self.ki)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Nominal tick period in milliseconds.
    pub period_ms: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self { period_ms: 20 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub style: DriveStyle,
    pub input_deadband: f64,
    pub motor_deadband: f64,
    pub left_inverted: bool,
    pub right_inverted: bool,
    pub left_encoder_inverted: bool,
    pub right_encoder_inverted: bool,
    pub gyro_inverted: bool,
    /// Encoder counts per physical distance unit (0 = report raw counts).
    pub counts_per_unit: f64,
    /// Loaded full-output encoder rate, counts/second.
    pub max_encoder_speed: f64,
    /// Output cap when pivoting under heading control.
    pub max_rotation_output: f64,
    pub speed_pid: PidConfig,
    pub heading_pid: PidConfig,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            style: DriveStyle::Arcade,
            input_deadband: DriveMixer::DEFAULT_INPUT_DEADBAND,
            motor_deadband: DriveMixer::DEFAULT_MOTOR_DEADBAND,
            left_inverted: false,
            right_inverted: true,
            left_encoder_inverted: false,
            right_encoder_inverted: true,
            gyro_inverted: false,
            counts_per_unit: 0.0,
            max_encoder_speed: 1.0,
            max_rotation_output: 0.5,
            speed_pid: PidConfig::default(),
            heading_pid: PidConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub tick: TickConfig,
    pub drive: DriveConfig,
}

impl RobotConfig {
    /// Semantic validation beyond what serde checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick.period_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tick.period_ms must be positive".to_string(),
            ));
        }

        if self.drive.max_encoder_speed <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "drive.max_encoder_speed must be positive, got {}",
                self.drive.max_encoder_speed
            )));
        }

        if !(0.0..=1.0).contains(&self.drive.max_rotation_output)
            || self.drive.max_rotation_output == 0.0
        {
            return Err(ConfigError::ValidationError(format!(
                "drive.max_rotation_output must be in (0, 1], got {}",
                self.drive.max_rotation_output
            )));
        }

        if self.drive.counts_per_unit < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "drive.counts_per_unit must not be negative, got {}",
                self.drive.counts_per_unit
            )));
        }

        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tiller_common::config::ConfigLoader;

    #[test]
    fn empty_config_uses_defaults_and_validates() {
        let config: RobotConfig = toml::from_str("").unwrap();
        assert_eq!(config.tick.period_ms, 20);
        assert_eq!(config.drive.style, DriveStyle::Arcade);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_config_round_trips() {
        let toml = r#"
[tick]
period_ms = 10

[drive]
style = "tank"
counts_per_unit = 100.0
max_encoder_speed = 1000.0
max_rotation_output = 0.7

[drive.speed_pid]
kp = 0.4
ki = 0.02

[drive.heading_pid]
kp = 0.015
ki = 0.001
"#;
        let config: RobotConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.tick.period_ms, 10);
        assert_eq!(config.drive.style, DriveStyle::Tank);
        assert_eq!(config.drive.speed_pid.kp, 0.4);
        assert_eq!(config.drive.heading_pid.ki, 0.001);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_tick_period_is_rejected() {
        let config: RobotConfig = toml::from_str("[tick]\nperiod_ms = 0").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn out_of_range_rotation_output_is_rejected() {
        let config: RobotConfig =
            toml::from_str("[drive]\nmax_rotation_output = 1.5").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[drive]\nstyle = \"single_stick\"").unwrap();

        let config = RobotConfig::load(file.path()).unwrap();
        assert_eq!(config.drive.style, DriveStyle::SingleStick);
    }
}
