use rocket::figment::providers::Env;
use rocket::figment::Figment;
use serde::Deserialize;
use thiserror::Error;

use crate::security::auth;

const DEFAULT_ADMIN_USER: &str = "admin";
const DEFAULT_ADMIN_PASS: &str = "password";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Extract(#[from] rocket::figment::Error),

    #[error("could not hash admin password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Raw process configuration, read once at startup.
///
/// Values come from Rocket's usual sources (`Rocket.toml`, `ROCKET_*`) plus
/// the bare `ADMIN_USER`, `ADMIN_PASS`, `SECURE_COOKIES` and `DATABASE`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    pub admin_user: String,
    pub admin_pass: String,
    pub secure_cookies: bool,
    pub database: String,
}

impl Default for BlogConfig {
    fn default() -> Self {
        BlogConfig {
            admin_user: DEFAULT_ADMIN_USER.to_string(),
            admin_pass: String::new(),
            secure_cookies: false,
            database: "blog.db".to_string(),
        }
    }
}

impl BlogConfig {
    pub fn figment() -> Figment {
        rocket::Config::figment().merge(Env::raw().only(&[
            "admin_user",
            "admin_pass",
            "secure_cookies",
            "database",
        ]))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    /// Freeze the credentials into an `AuthConfig`, hashing the password
    /// with the given bcrypt cost.
    pub fn into_auth(self, cost: u32) -> Result<AuthConfig, ConfigError> {
        let admin_username = if self.admin_user.is_empty() {
            DEFAULT_ADMIN_USER.to_string()
        } else {
            self.admin_user
        };

        let password = if self.admin_pass.is_empty() {
            log::warn!("ADMIN_PASS not set, using default password");
            DEFAULT_ADMIN_PASS.to_string()
        } else {
            self.admin_pass
        };

        Ok(AuthConfig {
            admin_username,
            admin_password_hash: auth::hash_password(&password, cost)?,
            secure_cookies: self.secure_cookies,
        })
    }
}

/// Immutable credentials and cookie policy, managed as Rocket state.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password_hash: String,
    pub secure_cookies: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_credentials() {
        let auth = BlogConfig::default().into_auth(4).unwrap();
        assert_eq!(auth.admin_username, "admin");
        assert!(auth::verify_password("password", &auth.admin_password_hash));
        assert!(!auth.secure_cookies);
    }

    #[test]
    fn figment_values_override_defaults() {
        let figment = Figment::new()
            .merge(("admin_user", "editor"))
            .merge(("admin_pass", "hunter2"))
            .merge(("secure_cookies", true));
        let config = BlogConfig::from_figment(&figment).unwrap();
        assert_eq!(config.database, "blog.db");

        let auth = config.into_auth(4).unwrap();
        assert_eq!(auth.admin_username, "editor");
        assert!(auth::verify_password("hunter2", &auth.admin_password_hash));
        assert!(!auth::verify_password("password", &auth.admin_password_hash));
        assert!(auth.secure_cookies);
    }
}
