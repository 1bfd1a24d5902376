//! Diagnostic tracing for the plan runner.
//!
//! Tracing goes to stderr and is controlled by `RUST_LOG`. The console
//! progress lines printed by `main` (`[CONTINUING]`, `[LOOP]`, `[DONE]`) go to
//! stdout and are not affected by it.

use tracing_subscriber::EnvFilter;

/// Filter directives used when `RUST_LOG` is unset.
///
/// `--verbose` shows this crate's debug events (agent steps, HTTP calls,
/// appends) while keeping dependencies at `warn`.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "plan_runner=debug,warn"
    } else {
        "warn"
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose`.
///
/// ```bash
/// RUST_LOG=plan_runner::agents=debug plan-runner run
/// ```
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    // A second install (e.g. from a test harness) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact()
        .try_init();
}
