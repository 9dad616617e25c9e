//! Command arguments and outcomes.
//!
//! Commands arrive as `(device_id, name, argument map)` tuples from the
//! presentation layer. Unknown commands and out-of-range arguments are
//! handled gracefully: the former produce [`CommandOutcome::Unrecognized`],
//! the latter are clamped by the device setters.

use serde_json::Value;

/// Argument map attached to a device command.
pub type CommandArgs = serde_json::Map<String, Value>;

/// Result of applying a command to a device. Never a process failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command was executed; carries a short human-readable result.
    Applied(String),
    /// The device does not know this command.
    Unrecognized,
}

impl CommandOutcome {
    pub fn applied(message: impl Into<String>) -> Self {
        CommandOutcome::Applied(message.into())
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied(_))
    }
}

impl std::fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandOutcome::Applied(msg) => f.write_str(msg),
            CommandOutcome::Unrecognized => f.write_str("unrecognized command"),
        }
    }
}

/// Numeric argument lookup with graceful fallback.
pub fn arg_f64(args: &CommandArgs, key: &str, default: f64) -> f64 {
    args.get(key).and_then(|v| v.as_f64()).unwrap_or(default)
}

/// Integer argument lookup with graceful fallback.
pub fn arg_i64(args: &CommandArgs, key: &str, default: i64) -> i64 {
    args.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_lookup_falls_back() {
        let mut args = CommandArgs::new();
        args.insert("level".into(), serde_json::json!(40));

        assert_eq!(arg_i64(&args, "level", 100), 40);
        assert_eq!(arg_i64(&args, "missing", 100), 100);
        assert_eq!(arg_f64(&args, "level", 0.0), 40.0);
    }
}
