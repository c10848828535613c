use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "warehouse_etl=info";
const VERBOSE_DIRECTIVE: &str = "warehouse_etl=debug,info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    /// One JSON object per event, for CloudWatch.
    Json,
}

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Filter directive for the crate's own events. An explicit level wins over
/// the verbose flag.
fn filter_directive(verbose: bool, level: Option<&str>) -> String {
    match level {
        Some(level) => format!("warehouse_etl={},info", level.trim().to_ascii_lowercase()),
        None if verbose => VERBOSE_DIRECTIVE.to_string(),
        None => DEFAULT_DIRECTIVE.to_string(),
    }
}

fn env_filter(verbose: bool, level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose, level)))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_logger(verbose: bool, format: LogFormat) {
    init_logger_with_level(verbose, None, format);
}

pub fn init_logger_with_level(verbose: bool, level: Option<&str>, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter(verbose, level));

    let result = match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!("Logger already initialised: {}", e);
    }
}

pub fn init_cli_logger(verbose: bool) {
    init_logger(verbose, LogFormat::Compact);
}

/// CLI logger honouring a configured level such as `[monitoring] log_level`.
pub fn init_cli_logger_with_level(verbose: bool, level: Option<&str>) {
    init_logger_with_level(verbose, level, LogFormat::Compact);
}

pub fn init_lambda_logger() {
    init_logger(false, LogFormat::Json);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(false, None), "warehouse_etl=info");
        assert_eq!(filter_directive(true, None), "warehouse_etl=debug,info");
        assert_eq!(filter_directive(false, Some("WARN")), "warehouse_etl=warn,info");
        assert_eq!(filter_directive(true, Some("error")), "warehouse_etl=error,info");
    }

    #[test]
    fn test_repeated_init_does_not_panic() {
        init_cli_logger(true);
        init_lambda_logger();
    }
}
