//! Tracing subscriber initialization.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to stderr; `RUST_LOG` wins over the verbosity flag
pub fn init_logger(verbose: bool, colored_output: bool) {
    let default_level = if verbose { "synthesmart=debug" } else { "synthesmart=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(colored_output);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
