use std::fmt;

/// How the CLI prints the final game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// CLI configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Output format for the final report.
    pub output: OutputFormat,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();
        AppConfig {
            log_filter: std::env::var("CHESS_LOG").unwrap_or(defaults.log_filter),
            output: std::env::var("CHESS_OUTPUT")
                .ok()
                .and_then(|v| OutputFormat::from_str_loose(&v))
                .unwrap_or(defaults.output),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_filter: "chess_rules=info".to_string(),
            output: OutputFormat::Text,
        }
    }
}
