//! Tracing initialisation for the packer2terraform binary.
//!
//! Log lines always go to stderr: stdout carries the rendered document and
//! must stay clean enough to redirect straight into a `.tfvars` file. ANSI
//! colours are only used when stderr is a terminal, so logs captured by CI
//! stay plain text.

use std::io::{self, IsTerminal};

use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter for `RUST_LOG`, falling back to `level` when it is unset or invalid.
fn log_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

/// Initialise the global tracing subscriber.
///
/// `json` switches to newline-delimited JSON lines; `level` is the
/// verbosity used when `RUST_LOG` does not say otherwise. The global
/// subscriber can only be set once, so later calls are no-ops.
pub fn init_tracing(json: bool, level: Level) {
    let output = fmt::layer()
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal());
    let output = if json {
        output.json().boxed()
    } else {
        output.boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(output)
        .with(log_filter(level))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_tracing(false, Level::WARN);
        init_tracing(true, Level::DEBUG);
    }
}
