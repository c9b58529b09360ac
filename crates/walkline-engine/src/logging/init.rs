use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "walkline_engine=debug,wgpu_core=warn"). When set, it takes precedence over
/// `RUST_LOG`.
///
/// `default_level` applies when neither `env_filter` nor `RUST_LOG` is present.
///
/// `write_style` controls ANSI coloring behavior.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// This function is idempotent; subsequent calls are ignored.
/// Intended usage is early in `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match resolve_filter(config.env_filter, std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(config.default_level);
            }
        }

        builder.write_style(config.write_style);

        // `try_init` so an embedding test binary that already set a logger does not panic.
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized");
    });
}

/// Picks the filter string: explicit config first, then the environment.
fn resolve_filter(explicit: Option<String>, env: Option<String>) -> Option<String> {
    explicit
        .or(env)
        .filter(|f| !f.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins_over_env() {
        let f = resolve_filter(Some("warn".into()), Some("trace".into()));
        assert_eq!(f.as_deref(), Some("warn"));
    }

    #[test]
    fn env_used_without_explicit() {
        let f = resolve_filter(None, Some("debug".into()));
        assert_eq!(f.as_deref(), Some("debug"));
    }

    #[test]
    fn blank_filter_falls_back_to_level() {
        assert_eq!(resolve_filter(None, Some("  ".into())), None);
        assert_eq!(resolve_filter(None, None), None);
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig::default());
    }
}
