use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `MOCKKIT_LOG=debug`.
pub const LOG_ENV: &str = "MOCKKIT_LOG";

/// Installs the stderr subscriber. `-v` forces `debug`, otherwise
/// `MOCKKIT_LOG` applies with `warn` as the default.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be set when running under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
