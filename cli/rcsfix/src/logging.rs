//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Everything goes to stderr so generated text written to stdout stays
//! clean. `RUST_LOG` overrides the verbosity flags when set.
//!
//! - `warn` (default): divergences, dropped layout offsets
//! - `info` (`-v`): one line per file generated or checked
//! - `debug` (`-vv`): graph sizes, serializer and parser progress
//! - `trace` (`-vvv`): every content entry written

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map a `-v` count to a level.
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = build_env_filter(level_from_verbosity(verbosity));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    let level = level.as_str().to_lowercase();
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Other crates stay at warn.
        EnvFilter::new(format!(
            "warn,rcsfix={level},rcs_core={level},rcs_text={level}"
        ))
    })
}
