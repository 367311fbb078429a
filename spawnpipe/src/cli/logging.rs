//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber writing to stderr.
///
/// `RUST_LOG` wins over the verbosity flag when it is set.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "spawnpipe=debug"
    } else {
        "spawnpipe=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
