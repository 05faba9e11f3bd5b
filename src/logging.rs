use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging on stderr.
///
/// Use the `RUST_LOG` environment variable to override the filter. Otherwise
/// `verbosity` picks it: 0 is `warn`, 1 is `debug`, 2 or more is `trace`.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbosity {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    });

    // Program output owns stdout.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
