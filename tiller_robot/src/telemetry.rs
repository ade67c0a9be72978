//! JSON-lines telemetry sink.
//!
//! One JSON object per published value, written to any `io::Write`.
//! Downstream dashboards tail the stream; write errors are swallowed
//! after a single warning because telemetry must never take the robot
//! down with it.

use std::io::Write;

use serde_json::json;
use tracing::warn;

use tiller_common::telemetry::Telemetry;

pub struct JsonlTelemetry<W: Write> {
    out: W,
    write_failed: bool,
}

impl<W: Write> JsonlTelemetry<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            write_failed: false,
        }
    }

    fn emit(&mut self, value: serde_json::Value) {
        if self.write_failed {
            return;
        }
        if writeln!(self.out, "{value}").is_err() {
            warn!("telemetry sink write failed, disabling further output");
            self.write_failed = true;
        }
    }
}

impl<W: Write> Telemetry for JsonlTelemetry<W> {
    fn publish_number(&mut self, key: &str, value: f64) {
        self.emit(json!({ "key": key, "value": value }));
    }

    fn publish_bool(&mut self, key: &str, value: bool) {
        self.emit(json!({ "key": key, "value": value }));
    }

    fn publish_str(&mut self, key: &str, value: &str) {
        self.emit(json!({ "key": key, "value": value }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_json_object_per_value() {
        let mut buffer = Vec::new();
        {
            let mut sink = JsonlTelemetry::new(&mut buffer);
            sink.publish_number("drive/heading", 90.5);
            sink.publish_bool("drive/speed_pids", true);
            sink.publish_str("mode", "auto");
        }

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["key"], "drive/heading");
        assert_eq!(first["value"], 90.5);
    }
}
