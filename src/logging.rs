//! Tracing initialization for the `tm` binary.

use std::sync::Once;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

static INIT: Once = Once::new();

/// Install a stderr subscriber. Safe to call multiple times; only the first
/// call has an effect.
///
/// When `RUST_LOG` is set its directives are used as-is. Otherwise the level
/// is INFO, or DEBUG with `verbose`.
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let result = tracing_subscriber::fmt()
            .with_env_filter(filter(verbose))
            .with_ansi(false)
            .with_target(false)
            .with_span_events(FmtSpan::NONE)
            .compact()
            .with_writer(std::io::stderr)
            .try_init();

        if let Err(e) = result {
            eprintln!("Failed to initialize tracing: {}", e);
        }
    });
}

fn filter(verbose: bool) -> EnvFilter {
    build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), verbose)
}

/// `rust_log` wins when it holds valid directives; `verbose` only picks the
/// fallback level.
fn build_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { "debug" } else { "info" }))
}
