use std::env;

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub environment: Environment,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expires_in_secs: i64,
    pub admin_emails: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Raw tokens are echoed back in API responses only outside production.
    pub fn exposes_dev_tokens(self) -> bool {
        self != Environment::Production
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DB_URL")
                .map_err(|_| AppError::ConfigError("DB_URL not set".to_string()))?,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| AppError::ConfigError("Invalid DB_MAX_CONNECTIONS value".to_string()))?,
        })
    }
}

const DEFAULT_JWT_EXPIRES_IN_SECS: i64 = 60 * 60;

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "4000".to_string())
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid PORT value".to_string()))?,
                max_body_size: env::var("MAX_BODY_SIZE")
                    .unwrap_or_else(|_| "6291456".to_string())
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid MAX_BODY_SIZE value".to_string()))?,
            },
            database: DatabaseConfig::from_env()?,
            cors: CorsConfig {
                allowed_origins: parse_origins(
                    &env::var("FRONTEND_URL").unwrap_or_else(|_| "*".to_string()),
                ),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| AppError::ConfigError("JWT_SECRET not set".to_string()))?,
                jwt_expires_in_secs: match env::var("JWT_EXPIRES_IN") {
                    Ok(raw) if !raw.trim().is_empty() => parse_expires_in(&raw)?,
                    _ => DEFAULT_JWT_EXPIRES_IN_SECS,
                },
                admin_emails: parse_admin_emails(
                    &env::var("ADMIN_EMAILS").unwrap_or_default(),
                ),
            },
            environment: match env::var("APP_ENV").as_deref() {
                Ok("production") => Environment::Production,
                _ => Environment::Development,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Accepts plain seconds (`3600`) or an amount with a unit, the way `JWT_EXPIRES_IN`
/// is usually written: `500ms`, `45s`, `30m`, `1.5h`, `7d`, `2w`, `1y`, `2 days`.
pub fn parse_expires_in(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    let invalid = || AppError::ConfigError(format!("Invalid JWT_EXPIRES_IN value: {}", raw));

    if let Ok(secs) = raw.parse::<i64>() {
        return if secs > 0 { Ok(secs) } else { Err(invalid()) };
    }

    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .ok_or_else(invalid)?;
    let (amount, unit) = raw.split_at(split);
    let amount: f64 = amount.parse().map_err(|_| invalid())?;

    let unit_ms: f64 = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => 1_000.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000.0,
        "d" | "day" | "days" => 86_400_000.0,
        "w" | "week" | "weeks" => 604_800_000.0,
        "y" | "yr" | "yrs" | "year" | "years" => 31_557_600_000.0,
        _ => return Err(invalid()),
    };

    let secs = (amount * unit_ms / 1_000.0).round();
    if !secs.is_finite() || secs < 1.0 || secs > i64::MAX as f64 {
        return Err(invalid());
    }

    Ok(secs as i64)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "*")
        .collect()
}

fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
