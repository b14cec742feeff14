//! Tracing subscriber setup for hosts embedding the heat-map.

use std::env;
use tracing_subscriber::EnvFilter;

/// Environment variable that forces debug-level output.
pub const DEBUG_ENV: &str = "ACTIVITY_HEATMAP_DEBUG_LOG";

/// Install a formatting subscriber.
///
/// Uses `debug` when [`DEBUG_ENV`] is truthy, otherwise `RUST_LOG`, otherwise
/// `info`. Returns false if a global subscriber was already set.
pub fn init() -> bool {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| is_truthy(&value))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}
