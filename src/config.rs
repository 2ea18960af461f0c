use anyhow::{anyhow, Context};

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| anyhow!("DATABASE_URL not found"))?;

        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| anyhow!("JWT_SECRET not found"))?;

        let access_token_expire_minutes = std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .unwrap_or_else(|_| "1440".to_string())
            .parse::<i64>()
            .context("ACCESS_TOKEN_EXPIRE_MINUTES must be an integer")?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("PORT must be a number")?;

        Ok(AppConfig {
            database_url,
            jwt_secret,
            access_token_expire_minutes,
            host,
            port,
        })
    }
}
