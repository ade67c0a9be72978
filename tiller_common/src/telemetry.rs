//! Key/value telemetry sink.
//!
//! Subsystems and commands publish diagnostic values through this seam.
//! Publication is fire-and-forget: a sink never feeds back into control
//! logic and never fails the caller.

use tracing::debug;

/// Fire-and-forget key/value publication for dashboards and logs.
///
/// Implementations must be cheap enough to call every tick.
pub trait Telemetry {
    /// Publish a numeric value.
    fn publish_number(&mut self, key: &str, value: f64);

    /// Publish a boolean value.
    fn publish_bool(&mut self, key: &str, value: bool);

    /// Publish a string value.
    fn publish_str(&mut self, key: &str, value: &str);
}

/// Sink that discards everything. Used by tests and headless runs.
#[derive(Debug, Default)]
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn publish_number(&mut self, _key: &str, _value: f64) {}
    fn publish_bool(&mut self, _key: &str, _value: bool) {}
    fn publish_str(&mut self, _key: &str, _value: &str) {}
}

/// Sink that forwards every value to the `tracing` subscriber at DEBUG.
///
/// Useful during bring-up when no dashboard is attached; with the default
/// INFO filter the per-tick traffic stays out of the log.
#[derive(Debug, Default)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn publish_number(&mut self, key: &str, value: f64) {
        debug!(target: "telemetry", key, value);
    }

    fn publish_bool(&mut self, key: &str, value: bool) {
        debug!(target: "telemetry", key, value);
    }

    fn publish_str(&mut self, key: &str, value: &str) {
        debug!(target: "telemetry", key, value);
    }
}

/// Sink that records the last value published per key.
///
/// Test double: assertions read back what a subsystem published.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    numbers: Vec<(String, f64)>,
    bools: Vec<(String, bool)>,
    strings: Vec<(String, String)>,
}

impl RecordingTelemetry {
    /// Last numeric value published under `key`, if any.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.numbers
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    /// Last boolean value published under `key`, if any.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.bools
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    /// Last string value published under `key`, if any.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.strings
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl Telemetry for RecordingTelemetry {
    fn publish_number(&mut self, key: &str, value: f64) {
        self.numbers.push((key.to_string(), value));
    }

    fn publish_bool(&mut self, key: &str, value: bool) {
        self.bools.push((key.to_string(), value));
    }

    fn publish_str(&mut self, key: &str, value: &str) {
        self.strings.push((key.to_string(), value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_returns_last_value_per_key() {
        let mut t = RecordingTelemetry::default();
        t.publish_number("heading", 10.0);
        t.publish_number("heading", 20.0);
        t.publish_bool("pids", true);
        t.publish_str("mode", "auto");

        assert_eq!(t.number("heading"), Some(20.0));
        assert_eq!(t.bool("pids"), Some(true));
        assert_eq!(t.str("mode"), Some("auto"));
        assert_eq!(t.number("missing"), None);
    }

    #[test]
    fn null_sink_accepts_everything() {
        let mut t = NullTelemetry;
        t.publish_number("x", 1.0);
        t.publish_bool("y", false);
        t.publish_str("z", "ok");
    }
}
