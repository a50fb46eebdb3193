use anyhow::{bail, Context};
use sltb_database::config::{get_env_or_throw, get_env_var_or_default};

pub fn init() {
    dotenv::dotenv().ok();
}

/// Token signing settings.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_seconds: i64,
}

impl AuthConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = get_env_or_throw("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            bail!("JWT_SECRET must be at least 32 characters");
        }
        let jwt_expiry_seconds = get_env_var_or_default("JWT_EXPIRY_SECONDS", "86400")
            .parse::<i64>()
            .context("JWT_EXPIRY_SECONDS must be a number of seconds")?;
        Ok(AuthConfig {
            jwt_secret,
            jwt_expiry_seconds,
        })
    }
}

/// Admin account to ensure at startup, when both variables are present.
#[derive(Clone, Debug)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl AdminSeed {
    pub fn from_env() -> Option<Self> {
        match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed { email, password })
            }
            _ => None,
        }
    }
}
