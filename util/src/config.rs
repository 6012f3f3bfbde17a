//! Application configuration.
//!
//! `AppConfig` is loaded exactly once at process start from `.env` and the
//! environment, then handed to `AppState`. Nothing reads the environment
//! after start-up: missing secrets make `from_env` fail instead of failing
//! per request.

use std::env;
use thiserror::Error;

/// Errors raised while building an [`AppConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Represents the complete application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    pub qr_secret: String,
    pub attendance: AttendancePolicy,
}

/// Switches for the optional attendance checks.
///
/// Both default to off: marks are accepted indefinitely once the window has
/// opened and the QR challenge is display-only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendancePolicy {
    /// Reject marks whose QR payload differs from the session's current one.
    pub require_qr: bool,
    /// Reject marks after `attendance_start + attendance_minutes`.
    pub enforce_close: bool,
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// `from_env` is a thin wrapper over this; tests feed a map instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let jwt_secret = required("JWT_SECRET")?;
        let qr_secret = lookup("QR_SECRET")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| jwt_secret.clone());

        Ok(Self {
            env: or("APP_ENV", "development"),
            project_name: or("PROJECT_NAME", "attendance-tracker"),
            log_level: or("LOG_LEVEL", "api=info,services=info"),
            log_file: or("LOG_FILE", "api.log"),
            log_to_stdout: parse_bool("LOG_TO_STDOUT", lookup("LOG_TO_STDOUT"), false)?,
            database_path: required("DATABASE_PATH")?,
            host: or("HOST", "127.0.0.1"),
            port: parse_num("PORT", lookup("PORT"), 3000)?,
            jwt_secret,
            jwt_duration_minutes: parse_num(
                "JWT_DURATION_MINUTES",
                lookup("JWT_DURATION_MINUTES"),
                60,
            )?,
            qr_secret,
            attendance: AttendancePolicy {
                require_qr: parse_bool(
                    "ATTENDANCE_REQUIRE_QR",
                    lookup("ATTENDANCE_REQUIRE_QR"),
                    false,
                )?,
                enforce_close: parse_bool(
                    "ATTENDANCE_ENFORCE_CLOSE",
                    lookup("ATTENDANCE_ENFORCE_CLOSE"),
                    false,
                )?,
            },
        })
    }

    /// A self-contained configuration for tests (in-memory SQLite).
    pub fn for_tests() -> Self {
        Self {
            env: "test".into(),
            project_name: "attendance-tracker".into(),
            log_level: "api=debug,services=debug".into(),
            log_file: "test.log".into(),
            log_to_stdout: false,
            database_path: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 0,
            jwt_secret: "test-jwt-secret".into(),
            jwt_duration_minutes: 60,
            qr_secret: "test-qr-secret".into(),
            attendance: AttendancePolicy::default(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

fn parse_bool(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(v) => Err(ConfigError::Invalid {
            key,
            value: v.to_string(),
        }),
    }
}

fn parse_num<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
            key,
            value: v.to_string(),
        }),
    }
}
