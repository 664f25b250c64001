use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "UTTERANCE_LOG";

/// Directives used when `UTTERANCE_LOG` is unset: errors from everything, plus this crate's
/// warnings (failed engine calls, rejected searches).
pub const DEFAULT_DIRECTIVES: &str = "error,utterance=warn";

/// Initialize structured JSON logging.
///
/// Uses [`DEFAULT_DIRECTIVES`] unless overridden by `UTTERANCE_LOG` (e.g.
/// `UTTERANCE_LOG=utterance=debug` to see every utterance transition).
pub fn init() {
    let directives = std::env::var(LOG_ENV_VAR).ok();

    let _ = tracing_subscriber::registry()
        .with(filter(directives.as_deref()))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .try_init();
}

fn filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .parse_lossy(directives.unwrap_or(DEFAULT_DIRECTIVES))
}
