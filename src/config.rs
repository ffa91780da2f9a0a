use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::Validate;

const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    pub environment: String,
    pub port: u16,
    pub database_url: String,

    // Connection pool tuning
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_connect_timeout_secs: u64,
    pub db_idle_timeout_secs: u64,
    pub db_acquire_timeout_secs: u64,

    /// Run embedded migrations on startup
    pub auto_migrate: bool,

    pub log_level: String,
    pub log_json: bool,

    /// Default and upper bound for list page sizes
    #[validate(range(min = 1, message = "default_page_size must be at least 1"))]
    pub default_page_size: u64,
    #[validate(range(min = 1, message = "max_page_size must be at least 1"))]
    pub max_page_size: u64,

    /// Template code dispatched by the debt reminder workflow
    pub reminder_template_code: String,

    /// Company contact details injected into outbound templates
    pub company_name: String,
    pub company_phone: String,

    /// Directory the template mirror cache is materialized into; disabled
    /// when unset
    pub template_mirror_dir: Option<String>,

    /// Development convenience: a pre-seeded admin session token
    pub bootstrap_admin_token: Option<String>,
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    fn validate_config(&self) -> Result<(), AppConfigError> {
        self.validate()
            .map_err(|e| AppConfigError::Invalid(e.to_string()))?;
        if self.port == 0 {
            return Err(AppConfigError::Invalid("port must not be 0".to_string()));
        }
        if self.max_page_size < self.default_page_size {
            return Err(AppConfigError::Invalid(
                "max_page_size must be >= default_page_size".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads configuration from `config/{default,<env>}.toml` plus `APP__*`
/// environment variables, env vars winning.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("environment", DEFAULT_ENV)?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("database_url", "sqlite://alumpro.db?mode=rwc")?
        .set_default("db_max_connections", 10)?
        .set_default("db_min_connections", 1)?
        .set_default("db_connect_timeout_secs", 30)?
        .set_default("db_idle_timeout_secs", 600)?
        .set_default("db_acquire_timeout_secs", 8)?
        .set_default("auto_migrate", true)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("default_page_size", DEFAULT_PAGE_SIZE as i64)?
        .set_default("max_page_size", MAX_PAGE_SIZE as i64)?
        .set_default("reminder_template_code", "debt_reminder")?
        .set_default("company_name", "AlumPro")?
        .set_default("company_phone", "")?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let cfg: AppConfig = config.try_deserialize()?;
    cfg.validate_config()?;
    Ok(cfg)
}

/// Installs the global tracing subscriber.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("alumpro_api={},tower_http=info", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::new(filter_directive);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            environment: "test".to_string(),
            port: 8080,
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 5,
            db_min_connections: 1,
            db_connect_timeout_secs: 5,
            db_idle_timeout_secs: 60,
            db_acquire_timeout_secs: 5,
            auto_migrate: true,
            log_level: "info".to_string(),
            log_json: false,
            default_page_size: 20,
            max_page_size: 100,
            reminder_template_code: "debt_reminder".to_string(),
            company_name: "AlumPro".to_string(),
            company_phone: "+90 555 000 0000".to_string(),
            template_mirror_dir: None,
            bootstrap_admin_token: None,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate_config().is_ok());
    }

    #[test]
    fn page_size_ordering_is_enforced() {
        let mut cfg = base_config();
        cfg.max_page_size = 10;
        cfg.default_page_size = 20;
        assert!(cfg.validate_config().is_err());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut cfg = base_config();
        cfg.port = 0;
        assert!(cfg.validate_config().is_err());
    }
}
