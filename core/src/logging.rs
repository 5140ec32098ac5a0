//! Tracing subscriber setup for hosts that want the core's log output.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

const CRATE_TARGET: &str = "diveoverlay_core";

/// Filter directive for a configured level.
///
/// A bare level such as `debug` applies to this crate only, with everything
/// else held at `warn` so a host's own dependencies stay quiet. Anything
/// containing a target (`=`) or several directives (`,`) is used verbatim.
fn directive(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        format!("warn,{}=info", CRATE_TARGET)
    } else if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("warn,{}={}", CRATE_TARGET, level)
    }
}

/// Install a global tracing subscriber. `RUST_LOG` overrides
/// [`LoggingConfig::level`] when set.
///
/// Returns `false` when a global subscriber was already installed, in which
/// case the existing one keeps running.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive(&config.level)))
        .unwrap_or_else(|_| EnvFilter::new(directive("")));

    let installed = if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    };

    if installed {
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), "dive overlay core logging ready");
    }
    installed
}

pub fn init_default_logging() -> bool {
    init_logging(&LoggingConfig::default())
}
