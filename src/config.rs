use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_EXTENSIONS: &[&str] = &["xlsx"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub topics_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub log_json: bool,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("GRADE_ADVISOR_HOST", "0.0.0.0");
        let port = parse_number("GRADE_ADVISOR_PORT", env_or_default("GRADE_ADVISOR_PORT", "5000"))?;
        let max_upload_mb: usize =
            parse_number("MAX_UPLOAD_MB", env_or_default("MAX_UPLOAD_MB", "10"))?;

        Ok(Self {
            host,
            port,
            topics_path: PathBuf::from(env_or_default("STUDY_TOPICS_PATH", "study_topics.xlsx")),
            upload_dir: PathBuf::from(env_or_default("UPLOAD_DIR", "uploads")),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            allowed_extensions: parse_list(env_optional("ALLOWED_EXTENSIONS"), DEFAULT_EXTENSIONS)
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            cors_origins: parse_list(env_optional("CORS_ORIGINS"), &[]),
            log_level: env_or_default("LOG_LEVEL", "info"),
            log_json: env_optional("LOG_JSON")
                .map(|value| parse_bool(&value))
                .unwrap_or(false),
        })
    }

    pub fn server_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "GRADE_ADVISOR_HOST",
                value: self.host.clone(),
            })
    }

    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue { field, value })
}

fn parse_list(value: Option<String>, defaults: &[&str]) -> Vec<String> {
    match value {
        Some(raw) => raw
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        None => defaults.iter().map(|item| item.to_string()).collect(),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
