//! Log subscriber setup for the console binaries.
//!
//! Console events are logged from the `parkwarden_core` and `parkwarden`
//! targets at the operator's chosen level; everything else is held at
//! `warn` so async runtime and serde chatter stays out of replays. A
//! `RUST_LOG` value replaces these directives entirely.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Targets that log at the requested level.
const CONSOLE_TARGETS: [&str; 2] = ["parkwarden_core", "parkwarden"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines on stderr.
    Text,
    /// One JSON object per event, for shipping replay logs.
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(CONSOLE_TARGETS.iter().map(|t| format!("{t}={level}")));
    directives.join(",")
}

/// Install the global subscriber. Only the first call in a process
/// takes effect.
pub fn init_tracing(json: bool, level: Level) {
    init_with_format(LogFormat::from_json_flag(json), level);
}

pub fn init_with_format(format: LogFormat, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Json => registry.with(layer.json()).try_init(),
        LogFormat::Text => registry.with(layer).try_init(),
    };
    if installed.is_ok() {
        tracing::debug!(event = "telemetry.installed", format = ?format);
    }
}
