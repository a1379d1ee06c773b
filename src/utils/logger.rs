use tracing_subscriber::fmt::{self, time::ChronoLocal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Wall-clock stamp with milliseconds, close to the precision of the readings.
const LOG_TIME_FORMAT: &str = "%H:%M:%S%.3f";

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "interval_demux=debug,info"
    } else {
        "interval_demux=info"
    }
}

/// `RUST_LOG` wins; otherwise this crate logs at info, or debug when verbose.
fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Compact lines for an operator watching the run. Verbose runs also show
/// which module logged each line.
pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            fmt::layer()
                .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
                .with_target(verbose)
                .compact(),
        )
        .init();
}

/// JSON lines on stderr, for runs whose log is collected by another tool.
pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .json(),
        )
        .init();
}
