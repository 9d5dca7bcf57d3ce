use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Filter used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "git_versioning=info,warn";
const VERBOSE_FILTER: &str = "git_versioning=debug,info";

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `verbose`. Calling this more than once is
/// harmless; only the first call installs anything.
pub fn init(verbose: bool) -> Result<(), String> {
    static INIT_RESULT: OnceLock<Result<(), String>> = OnceLock::new();

    INIT_RESULT
        .get_or_init(|| {
            let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if verbose {
                    VERBOSE_FILTER.into()
                } else {
                    DEFAULT_FILTER.into()
                }
            });

            let fmt_layer = fmt::Layer::new()
                .with_target(verbose)
                .with_level(true)
                .with_writer(std::io::stderr);

            Registry::default()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| format!("Failed to initialize logging: {}", e))
        })
        .clone()
}
