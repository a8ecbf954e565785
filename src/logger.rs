//! Log output for applications embedding the reader
//!
//! The crate only emits `tracing` events; nothing is printed until a caller
//! installs a subscriber, for instance with [`init`].

pub use tracing::{debug, error, info, instrument, trace, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "dmcframes=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Span timings are only worth printing when debug events are enabled.
fn span_events(filter: &EnvFilter) -> FmtSpan {
    match <EnvFilter as Layer<Registry>>::max_level_hint(filter) {
        Some(level) if level >= LevelFilter::DEBUG => FmtSpan::CLOSE,
        _ => FmtSpan::NONE,
    }
}

/// Installs the global subscriber, returning `false` if one is already set.
pub fn try_init() -> bool {
    let filter = env_filter();
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_span_events(span_events(&filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}

/// Installs the global subscriber. Keeps an existing one if already set.
pub fn init() {
    if !try_init() {
        debug!("Global subscriber already installed, keeping it");
    }
}
