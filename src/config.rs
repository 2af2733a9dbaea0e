use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    pub base_url: String,
    pub jwt_secret: String,
    pub google_client_id: String,
    pub vision_api_url: String,
    pub vision_api_key: String,
    pub vision_model: String,
    pub vision_retry_base_delay_ms: u64,
    pub payment_api_url: String,
    pub payment_app_id: String,
    pub payment_secret_key: String,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/askshot".to_string()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key".to_string()),
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            vision_api_url: env::var("VISION_API_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            vision_api_key: env::var("VISION_API_KEY").unwrap_or_default(),
            vision_model: env::var("VISION_MODEL")
                .unwrap_or_else(|_| "claude-3-sonnet-20240229".to_string()),
            vision_retry_base_delay_ms: env::var("VISION_RETRY_BASE_DELAY_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            payment_api_url: env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.cashfree.com/pg".to_string()),
            payment_app_id: env::var("PAYMENT_APP_ID").unwrap_or_default(),
            payment_secret_key: env::var("PAYMENT_SECRET_KEY").unwrap_or_default(),
            email_api_url: env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            email_api_key: env::var("EMAIL_API_KEY").unwrap_or_default(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "AskShot <onboarding@resend.dev>".to_string()),
        })
    }
}
