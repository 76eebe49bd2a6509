use std::sync::Once;

/// Logger settings. `filter` uses the `env_logger` syntax, for example
/// `"info"` or `"primitives_runtime=debug"`.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub filter: Option<String>,
}

impl LoggingConfig {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Later calls are ignored.
///
/// Without an explicit filter `RUST_LOG` is honoured, falling back to `info`.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        if let Some(filter) = config.filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }
        // A test harness may have installed a logger already.
        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

/// Routes `log` records and panics to the browser console. Later calls are
/// ignored.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        let level = config
            .filter
            .as_deref()
            .and_then(|filter| filter.parse::<log::Level>().ok())
            .unwrap_or(log::Level::Info);
        if console_log::init_with_level(level).is_ok() {
            log::debug!("logging initialized");
        }
    });
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(LoggingConfig::with_filter("warn"));
        init_logging(LoggingConfig::default());
        log::warn!("still logging");
    }
}
