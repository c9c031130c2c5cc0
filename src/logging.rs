//! Structured logging setup for the command-line entry point.

use tracing_subscriber::EnvFilter;

/// Level used for this crate's events at a given `-v` count.
pub fn level_for(verbosity: u8) -> &'static str {
  match verbosity {
    0 => "info",
    1 => "debug",
    _ => "trace",
  }
}

/// Install a formatted subscriber writing to stderr.
///
/// The filter comes from the verbosity flag only. Calling this more than once keeps the first
/// subscriber.
pub fn init(verbosity: u8) {
  let filter = EnvFilter::new(format!("warn,static_bundler={}", level_for(verbosity)));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}
