use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "DUET_LOG";
const DEFAULT_LOG_LEVEL: &str = "warn";

pub fn resolve_log_filter(cli_level: Option<&str>, env_value: Option<String>) -> String {
    if let Some(level) = cli_level.map(str::trim).filter(|level| !level.is_empty()) {
        return match level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => level.to_ascii_lowercase(),
            _ => DEFAULT_LOG_LEVEL.to_string(),
        };
    }
    env_value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// Installs the stderr subscriber. Repeated calls are ignored so tests and
/// the binary can share the command entry point.
pub fn init_logging(cli_level: Option<&str>) {
    let filter = resolve_log_filter(cli_level, std::env::var(LOG_ENV_VAR).ok());
    let env_filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::resolve_log_filter;

    #[test]
    fn cli_level_wins_over_environment() {
        assert_eq!(
            resolve_log_filter(Some("DEBUG"), Some("error".to_string())),
            "debug"
        );
    }

    #[test]
    fn unknown_cli_level_falls_back_to_warn() {
        assert_eq!(resolve_log_filter(Some("loud"), None), "warn");
    }

    #[test]
    fn environment_filter_is_used_verbatim() {
        assert_eq!(
            resolve_log_filter(None, Some("duet=trace,ureq=off".to_string())),
            "duet=trace,ureq=off"
        );
        assert_eq!(resolve_log_filter(None, Some("  ".to_string())), "warn");
    }
}
