use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub log_level: String,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Credentials for the admin account seeded at startup.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        if jwt_secret.trim().is_empty() {
            return Err("JWT_SECRET must not be empty".to_string());
        }

        let host: IpAddr = env_or("ROLEGATE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid ROLEGATE_HOST: {e}"))?;

        let port: u16 = env_or("ROLEGATE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid ROLEGATE_PORT: {e}"))?;

        let max_body_size: usize = env_or("ROLEGATE_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid ROLEGATE_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("ROLEGATE_LOG_LEVEL", "info");

        let bootstrap_admin = match (
            std::env::var("ADMIN_EMAIL").ok(),
            std::env::var("ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            _ => {
                return Err(
                    "ADMIN_EMAIL and ADMIN_PASSWORD must be set together".to_string(),
                );
            }
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            max_body_size,
            log_level,
            bootstrap_admin,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
