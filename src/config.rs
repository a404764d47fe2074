use crate::error::AppError;
use dotenv::dotenv;
use std::{env, net::{IpAddr, SocketAddr}, str::FromStr};

const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" | "" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "LOG_FORMAT must be 'compact' or 'json', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub worker_threads: usize,
    /// Mount prefix for the echo route, stored without surrounding slashes.
    pub route_prefix: String,
    pub max_body_bytes: usize,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            worker_threads: num_cpus::get(),
            route_prefix: String::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_format: LogFormat::Compact,
        }
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn new() -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            worker_threads: parse_var(&lookup, "WORKER_THREADS", defaults.worker_threads)?
                .max(1),
            route_prefix: lookup("ROUTE_PREFIX")
                .map(|p| p.trim().trim_matches('/').to_string())
                .unwrap_or(defaults.route_prefix),
            max_body_bytes: parse_var(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes)?,
            log_format: match lookup("LOG_FORMAT") {
                Some(value) => value.parse()?,
                None => defaults.log_format,
            },
        })
    }

    /// Path the echo handler is mounted at, e.g. `/echo` or `/api/echo`.
    pub fn echo_path(&self) -> String {
        if self.route_prefix.is_empty() {
            "/echo".to_string()
        } else {
            format!("/{}/echo", self.route_prefix)
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        self.host
            .parse::<IpAddr>()
            .map(|ip| SocketAddr::new(ip, self.port))
            .map_err(|_| AppError::Config(format!("HOST '{}' is not a valid IP address", self.host)))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", key, raw))),
        None => Ok(default),
    }
}
