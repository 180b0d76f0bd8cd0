// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Questions drawn from GENERAL themes in a simulacro (30% of 40).
pub const SIMULACRO_GENERAL_COUNT: usize = 12;
/// Questions drawn from SPECIFIC themes in a simulacro (70% of 40).
pub const SIMULACRO_SPECIFIC_COUNT: usize = 28;
pub const SIMULACRO_QUESTION_COUNT: usize = SIMULACRO_GENERAL_COUNT + SIMULACRO_SPECIFIC_COUNT;

/// Default and maximum page size for exam/attempt listings.
pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let log_dir = env::var("LOG_DIR")
            .unwrap_or_else(|_| "logs".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            log_dir,
        }
    }
}
