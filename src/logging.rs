//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` wins, otherwise `fallback`, otherwise `info`.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global fmt subscriber. Later calls are no-ops.
pub fn init(fallback: &str) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(fallback))
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(fallback, "logging initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        init("debug");
        init("warn");
    }

    #[test]
    fn invalid_fallback_still_yields_a_filter() {
        // `RUST_LOG` may be set by the environment running the tests,
        // so only check that construction succeeds.
        let _ = env_filter("[[[not a directive");
    }
}
