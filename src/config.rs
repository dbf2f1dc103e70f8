// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use dotenvy::dotenv;

/// Token lifetime when `JWT_EXPIRATION` is not set: one school day.
pub const DEFAULT_JWT_EXPIRATION: u64 = 8 * 60 * 60;

/// Seed values for the first teacher account.
#[derive(Debug, Clone)]
pub struct TeacherSeed {
    pub username: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. The in-memory store is used when absent.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub cors_origins: Vec<String>,
    pub teacher_seed: Option<TeacherSeed>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiration = match env::var("JWT_EXPIRATION") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "JWT_EXPIRATION",
                value: raw,
            })?,
            Err(_) => DEFAULT_JWT_EXPIRATION,
        };

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                value: raw,
            })?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        let teacher_seed = match (env::var("TEACHER_USERNAME"), env::var("TEACHER_PASSWORD")) {
            (Ok(username), Ok(password)) => Some(TeacherSeed {
                name: env::var("TEACHER_NAME").unwrap_or_else(|_| username.clone()),
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            upload_dir,
            public_base_url,
            cors_origins,
            teacher_seed,
        })
    }

    /// Configuration suitable for tests and local experiments.
    pub fn for_tests(jwt_secret: &str, upload_dir: PathBuf) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration: 600,
            rust_log: "error".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            upload_dir,
            public_base_url: "http://localhost:3000".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            teacher_seed: None,
        }
    }
}
