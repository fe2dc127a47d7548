//! Tracing subscriber setup

use crate::config::GlobalConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATES: [&str; 4] = ["vscreen", "vscreen_core", "vscreen_media", "vscreen_service"];

/// Filter used when `RUST_LOG` is unset
pub fn default_directives(debug_logging: bool) -> String {
    let level = if debug_logging { "debug" } else { "info" };
    let mut directives = vec!["warn".to_string()];
    directives.extend(CRATES.iter().map(|krate| format!("{}={}", krate, level)));
    directives.join(",")
}

/// Install a global fmt subscriber
///
/// `RUST_LOG` wins over the configured level. Returns false when a global
/// subscriber was already installed, which is harmless.
pub fn init_tracing(config: &GlobalConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config.debug_logging)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}
