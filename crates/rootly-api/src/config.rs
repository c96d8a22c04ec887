//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rootly_classifier::{ClassifierCommand, OutputMode};

/// Classifier process configuration.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Executable to run
    pub program: String,
    /// Arguments placed before the image path
    pub args: Vec<String>,
    /// Working directory for the process
    pub working_dir: Option<PathBuf>,
    /// Spawn-to-exit limit
    pub timeout: Duration,
    /// Maximum classifier processes running at once
    pub max_concurrent: usize,
    /// How long a request may wait for a free slot
    pub queue_timeout: Duration,
    /// Whether stdout must parse as a prediction
    pub output_mode: OutputMode,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["../ai-service/app.py".to_string()],
            working_dir: None,
            timeout: Duration::from_secs(60),
            max_concurrent: default_concurrency(),
            queue_timeout: Duration::from_secs(30),
            output_mode: OutputMode::Passthrough,
        }
    }
}

impl ClassifierConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            program: std::env::var("CLASSIFIER_PROGRAM").unwrap_or(defaults.program),
            args: std::env::var("CLASSIFIER_ARGS")
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or(defaults.args),
            working_dir: std::env::var("CLASSIFIER_WORKDIR").ok().map(PathBuf::from),
            timeout: Duration::from_secs(env_or("CLASSIFIER_TIMEOUT_SECS", 60)),
            max_concurrent: env_or("CLASSIFIER_MAX_CONCURRENT", defaults.max_concurrent),
            queue_timeout: Duration::from_secs(env_or("CLASSIFIER_QUEUE_TIMEOUT_SECS", 30)),
            output_mode: env_or("CLASSIFIER_OUTPUT_MODE", OutputMode::Passthrough),
        }
    }

    /// Build the command described by this config.
    pub fn command(&self) -> ClassifierCommand {
        let cmd = ClassifierCommand::new(self.program.clone()).args(self.args.iter().cloned());
        match self.working_dir {
            Some(ref dir) => cmd.current_dir(dir),
            None => cmd,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second per IP (0 disables)
    pub rate_limit_rps: u32,
    /// Take the client IP from X-Forwarded-For / X-Real-IP (only behind a proxy that sets them)
    pub trust_proxy_headers: bool,
    /// Max request body size
    pub max_body_size: usize,
    /// Max size of the uploaded image itself
    pub max_upload_bytes: u64,
    /// Accepted image extensions (lowercase, no dot)
    pub allowed_extensions: Vec<String>,
    /// Directory where uploads are staged
    pub scratch_dir: PathBuf,
    /// Classifier process settings
    pub classifier: ClassifierConfig,
    /// Whether /metrics is served
    pub metrics_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            trust_proxy_headers: false,
            max_body_size: 10 * 1024 * 1024, // 10MB
            max_upload_bytes: 5 * 1024 * 1024, // 5MB
            allowed_extensions: default_extensions(),
            scratch_dir: PathBuf::from("uploads"),
            classifier: ClassifierConfig::default(),
            metrics_enabled: true,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("API_PORT", 8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            rate_limit_rps: env_or("RATE_LIMIT_RPS", 10),
            trust_proxy_headers: std::env::var("TRUST_PROXY_HEADERS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            max_body_size: env_or("MAX_BODY_SIZE", 10 * 1024 * 1024),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 5 * 1024 * 1024),
            allowed_extensions: std::env::var("ALLOWED_EXTENSIONS")
                .map(|s| parse_extensions(&s))
                .unwrap_or_else(|_| default_extensions()),
            scratch_dir: std::env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            classifier: ClassifierConfig::from_env(),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn default_extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extensions() {
        assert_eq!(parse_extensions(".PNG, jpg,,webp "), vec!["png", "jpg", "webp"]);
    }

    #[test]
    fn test_defaults_match_upload_limits() {
        let config = ApiConfig::default();
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.allowed_extensions, vec!["png", "jpg", "jpeg"]);
        assert_eq!(config.classifier.output_mode, OutputMode::Passthrough);
        assert!(!config.is_production());
        assert!(!config.trust_proxy_headers);

        let config = ApiConfig {
            environment: "Production".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.is_production());
    }

    #[test]
    fn test_classifier_command() {
        let config = ClassifierConfig {
            program: "python3".to_string(),
            args: vec!["classify.py".to_string(), "--json".to_string()],
            ..ClassifierConfig::default()
        };
        let cmd = config.command();
        assert_eq!(cmd.program(), "python3");
        assert_eq!(
            cmd.display(std::path::Path::new("uploads/a.jpg")),
            "python3 classify.py --json uploads/a.jpg"
        );
    }
}
