//! Level-filtered script log output.
//!
//! Lines are formatted as `[SEVERITY] YYYY/MM/DD HH:MM:SS message` and
//! handed to an unbounded channel, so emitting never waits on the sink.

use chrono::{DateTime, Local};
use crossbeam_channel::Sender;

use crate::model::LogLevel;
use crate::runtime::ScriptValue;

pub const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct LogChannel {
    level: LogLevel,
    sink: Sender<String>,
}

impl LogChannel {
    pub fn new(sink: Sender<String>) -> Self {
        Self {
            level: LogLevel::Disable,
            sink,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Sets the current level and returns the previous one. Values outside
    /// the severity range (including `Inherit`) leave the level unchanged.
    pub fn set_level(&mut self, level: i64) -> i64 {
        let previous = self.level.as_i64();
        match LogLevel::from_i64(level) {
            Some(level) if !level.is_inherit() => self.level = level,
            _ => tracing::debug!(level, "ignored out of range log level"),
        }
        previous
    }

    /// Forwards `message` if `level` is a real severity no more verbose
    /// than the current level. Returns whether a line was sent.
    pub fn emit(&self, level: i64, message: &str) -> bool {
        let Some(severity) = LogLevel::from_i64(level) else {
            return false;
        };
        if severity < LogLevel::Error || severity > LogLevel::Debug || severity > self.level {
            return false;
        }
        let line = format_line(severity, Local::now(), message);
        if self.sink.send(line).is_err() {
            tracing::warn!("log sink disconnected, dropping script log line");
            return false;
        }
        true
    }

    /// Emits a debug-level record of a call.
    pub fn trace(&self, name: &str, args: &[ScriptValue]) -> bool {
        self.emit(LogLevel::Debug.as_i64(), &trace_message(name, args))
    }
}

pub fn format_line(level: LogLevel, time: DateTime<Local>, message: &str) -> String {
    format!("[{}] {} {}", level.label(), time.format(TIME_FORMAT), message)
}

/// `=> name(arg1, arg2)` with string arguments quoted.
pub fn trace_message(name: &str, args: &[ScriptValue]) -> String {
    let args: Vec<String> = args
        .iter()
        .map(|arg| match arg {
            ScriptValue::Str(text) => format!("\"{text}\""),
            other => other.to_string(),
        })
        .collect();
    format!("=> {name}({})", args.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crossbeam_channel::unbounded;

    #[test]
    fn filters_by_current_level() {
        let (tx, rx) = unbounded();
        let mut channel = LogChannel::new(tx);
        channel.set_level(LogLevel::Warn.as_i64());

        assert!(!channel.emit(LogLevel::Info.as_i64(), "x"));
        assert!(channel.emit(LogLevel::Error.as_i64(), "y"));
        let lines: Vec<String> = rx.try_iter().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[ERROR] "));
        assert!(lines[0].ends_with(" y"));
    }

    #[test]
    fn rejects_out_of_range_levels() {
        let (tx, rx) = unbounded();
        let mut channel = LogChannel::new(tx);
        channel.set_level(LogLevel::Debug.as_i64());
        assert!(!channel.emit(0, "disabled"));
        assert!(!channel.emit(5, "inherit"));
        assert!(!channel.emit(-1, "negative"));
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn set_level_returns_previous_and_ignores_inherit() {
        let (tx, _rx) = unbounded();
        let mut channel = LogChannel::new(tx);
        assert_eq!(channel.set_level(3), 0);
        assert_eq!(channel.set_level(5), 3);
        assert_eq!(channel.set_level(42), 3);
        assert_eq!(channel.level(), LogLevel::Info);
    }

    #[test]
    fn formats_timestamp() {
        let time = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            format_line(LogLevel::Warn, time, "careful"),
            "[WARN] 2024/03/09 07:05:01 careful"
        );
    }

    #[test]
    fn trace_quotes_strings() {
        let message = trace_message(
            "copy",
            &[
                ScriptValue::Str("a.txt".into()),
                ScriptValue::Int(3),
                ScriptValue::Bool(true),
            ],
        );
        assert_eq!(message, "=> copy(\"a.txt\", 3, true)");
    }

    #[test]
    fn disconnected_sink_does_not_block() {
        let (tx, rx) = unbounded();
        let mut channel = LogChannel::new(tx);
        channel.set_level(4);
        drop(rx);
        assert!(!channel.emit(1, "lost"));
    }
}
