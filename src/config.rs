//! Process configuration, read once from the environment at startup

use crate::error::ConfigError;
use std::env;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_MAILSERVER_URL: &str = "https://api.mailersend.com/v1";

/// Current deployment environment (`production`, `prod`, `sandbox`, ...)
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub database_url: String,
    pub redis_url: String,
    pub worker: WorkerConfig,
    pub metrics_port: u16,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub max_retries: usize,
    /// Delay before the first retry; doubled on every further attempt
    pub retry_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub sender_name: String,
    pub sender_email: String,
    pub transport: MailTransport,
}

/// Outbound channel used by the mail sender
#[derive(Debug, Clone)]
pub enum MailTransport {
    /// Hosted MailerSend API with server-side templates
    Api(ApiMailConfig),
    /// HTML rendered locally and relayed over SMTP
    Smtp(SmtpMailConfig),
}

#[derive(Debug, Clone)]
pub struct ApiMailConfig {
    pub base_url: String,
    pub api_key: String,
    pub welcome_template_id: String,
    pub signal_template_id: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SmtpMailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub product_name: String,
    pub product_link: String,
}

impl Config {
    /// Build the configuration from process environment variables.
    ///
    /// Call `dotenvy::dotenv()` beforehand to pick up a local `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let environment = get("ENVIRONMENT").unwrap_or_else(|| "sandbox".to_string());
        let database_url = require("POSTGRES_URL")?;

        let redis_url = redis_url_from_lookup(&lookup);

        let worker = WorkerConfig {
            concurrency: parse_or("WORKER_CONCURRENCY", get("WORKER_CONCURRENCY"), DEFAULT_CONCURRENCY)?,
            max_retries: parse_or("WORKER_MAX_RETRIES", get("WORKER_MAX_RETRIES"), DEFAULT_MAX_RETRIES)?,
            retry_backoff: get("WORKER_RETRY_BACKOFF_MS")
                .map(|raw| parse_or("WORKER_RETRY_BACKOFF_MS", Some(raw), 0u64))
                .transpose()?
                .map_or(DEFAULT_RETRY_BACKOFF, Duration::from_millis),
        };
        if worker.concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "WORKER_CONCURRENCY",
                reason: "must be > 0".to_string(),
            });
        }

        let metrics_port = parse_or("METRICS_PORT", get("METRICS_PORT"), 9090u16)?;

        let transport_kind = get("MAIL_TRANSPORT").unwrap_or_else(|| "api".to_string());
        let transport = match transport_kind.to_ascii_lowercase().as_str() {
            "api" => MailTransport::Api(ApiMailConfig {
                base_url: get("MAILSERVER_URL").unwrap_or_else(|| DEFAULT_MAILSERVER_URL.to_string()),
                api_key: require("MAILSERVER_APIKEY")?,
                welcome_template_id: require("TEMP_WELCOME_ID")?,
                signal_template_id: require("TEMP_SIGNAL_ID")?,
                timeout: Duration::from_secs(5),
            }),
            "smtp" => MailTransport::Smtp(SmtpMailConfig {
                host: require("SMTP_HOST")?,
                port: parse_or("SMTP_PORT", get("SMTP_PORT"), 587u16)?,
                username: require("SMTP_USERNAME")?,
                password: require("SMTP_PASSWORD")?,
                product_name: get("PRODUCT_NAME").unwrap_or_else(|| "TradeSignal".to_string()),
                product_link: get("PRODUCT_LINK")
                    .unwrap_or_else(|| "https://tradesignal.app".to_string()),
            }),
            other => {
                return Err(ConfigError::Invalid {
                    key: "MAIL_TRANSPORT",
                    reason: format!("expected 'api' or 'smtp', got '{}'", other),
                })
            }
        };

        let mail = MailConfig {
            sender_name: require("SENDER_NAME")?,
            sender_email: require("SENDER_EMAIL")?,
            transport,
        };

        Ok(Self {
            environment,
            database_url,
            redis_url,
            worker,
            metrics_port,
            mail,
        })
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }
}

/// Redis URL from `REDIS_URL`, or assembled from `REDIS_ADDR` / `REDIS_PASSWORD`
pub fn redis_url_from_env() -> String {
    redis_url_from_lookup(&|key: &str| env::var(key).ok())
}

fn redis_url_from_lookup<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    if let Some(url) = get("REDIS_URL") {
        return url;
    }
    let addr = get("REDIS_ADDR").unwrap_or_else(|| "127.0.0.1:6379".to_string());
    match get("REDIS_PASSWORD") {
        Some(password) => format!("redis://:{}@{}/", password, addr),
        None => format!("redis://{}/", addr),
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
