use std::env;

use crate::utils::helpers::parse_expiry;

const DEFAULT_ACCESS_TOKEN_EXPIRY: &str = "1d";
const DEFAULT_REFRESH_TOKEN_EXPIRY: &str = "10d";

/// Server and database settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database_name: String,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| "PORT must be a valid number")?,
            mongodb_uri: env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database_name: env::var("DB_NAME").unwrap_or_else(|_| "rust_blogdb".to_string()),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.trim().is_empty()),
        })
    }
}

/// Secrets and lifetimes for access and refresh tokens
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub access_token_ttl: i64,
    pub refresh_token_secret: String,
    pub refresh_token_ttl: i64,
}

impl AuthConfig {
    pub fn new(
        access_token_secret: impl Into<String>,
        access_token_ttl: i64,
        refresh_token_secret: impl Into<String>,
        refresh_token_ttl: i64,
    ) -> Self {
        Self {
            access_token_secret: access_token_secret.into(),
            access_token_ttl,
            refresh_token_secret: refresh_token_secret.into(),
            refresh_token_ttl,
        }
    }

    pub fn from_env() -> Result<Self, String> {
        let access_token_expiry = env::var("ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| DEFAULT_ACCESS_TOKEN_EXPIRY.to_string());
        let refresh_token_expiry = env::var("REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| DEFAULT_REFRESH_TOKEN_EXPIRY.to_string());

        Ok(Self::new(
            env::var("ACCESS_TOKEN_SECRET").map_err(|_| "ACCESS_TOKEN_SECRET is required")?,
            parse_expiry(&access_token_expiry)
                .ok_or("ACCESS_TOKEN_EXPIRY must look like 3600, 15m, 12h or 1d")?,
            env::var("REFRESH_TOKEN_SECRET").map_err(|_| "REFRESH_TOKEN_SECRET is required")?,
            parse_expiry(&refresh_token_expiry)
                .ok_or("REFRESH_TOKEN_EXPIRY must look like 3600, 15m, 12h or 1d")?,
        ))
    }
}
