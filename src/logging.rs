//! Diagnostic logging on stderr.
//!
//! `UNIPKG_LOG` takes a full `tracing` filter directive and wins over the
//! `--verbose` / `--quiet` flags.

use crate::constants::ENV_LOG;
use tracing_subscriber::EnvFilter;

/// Default directive for the given verbosity flags.
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "unipkg=debug",
        (false, true) => "error",
        (false, false) => "warn",
    }
}

pub fn filter(verbose: bool, quiet: bool) -> EnvFilter {
    EnvFilter::try_from_env(ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbose: bool, quiet: bool) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .try_init();

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true, false), "unipkg=debug");
        assert_eq!(default_directive(true, true), "unipkg=debug");
        assert_eq!(default_directive(false, true), "error");
        assert_eq!(default_directive(false, false), "warn");
    }
}
