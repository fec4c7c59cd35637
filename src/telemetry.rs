use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "AI_ENV_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

static INIT: Once = Once::new();

/// Installs the stderr log subscriber. Only the first call has any effect.
///
/// The filter comes from `AI_ENV_LOG` (e.g. `debug` or `ai_env=trace`) and
/// falls back to `warn`.
pub fn init_logging(ansi: bool) {
    INIT.call_once(|| {
        let filter = log_filter(std::env::var(LOG_ENV).ok().as_deref());
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(ansi)
                    .with_target(false),
            )
            .try_init();
    });
}

fn log_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_to_warn() {
        assert_eq!(log_filter(None).to_string(), "warn");
        assert_eq!(log_filter(Some("  ")).to_string(), "warn");
    }

    #[test]
    fn filter_uses_directive() {
        assert_eq!(log_filter(Some("debug")).to_string(), "debug");
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(false);
        init_logging(true);
    }
}
