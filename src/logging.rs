/*
 * logging.rs
 *
 * Internal tracing for debugging the supervisor itself. Off unless
 * TIMEOUT_LOG is set (e.g. TIMEOUT_LOG=debug), and always on stderr so
 * it never mixes into the command's stdout.
 *
 * The "timeout: ..." lines users see are plain eprintln and don't go
 * through here.
 */

use std::io;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "TIMEOUT_LOG";

/// Install the stderr subscriber. Safe to call twice; the second call does nothing.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));

    /* a library caller may already have a subscriber, theirs wins */
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
        tracing::debug!("still alive");
    }
}
