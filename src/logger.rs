use std::io;
use tracing_subscriber::EnvFilter;

/// Default level for the crate given the CLI verbosity flags.
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "img_publish=debug,info"
    } else {
        "info"
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the flags.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false), "info");
        assert_eq!(default_directive(true, false), "img_publish=debug,info");
        assert_eq!(default_directive(false, true), "error");
        assert_eq!(default_directive(true, true), "error");
    }
}
