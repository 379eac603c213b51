//! Service settings
//!
//! Layered from built-in defaults, an optional `inventory.toml` (or any other
//! format the `config` crate recognises) in the working directory, and
//! `INVENTORY__*` environment variables, e.g. `INVENTORY__BIND_ADDRESS` or
//! `INVENTORY__BOOTSTRAP_ADMIN__EMAIL`. Database settings are read separately
//! through [`common::DatabaseConfig`].

use axum_extra::extract::cookie::Key;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::models::{Role, UserCandidate};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_ORGANIZATION_DOMAIN: &str = "nucleusteq.com";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("cookie_secret must be at least 64 bytes")]
    CookieSecret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Administrator account created at startup when missing
#[derive(Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_no: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl BootstrapAdmin {
    pub fn candidate(&self) -> UserCandidate {
        UserCandidate {
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            dob: None,
            phone_no: Some(self.phone_no.clone()),
            email: Some(self.email.clone()),
            role: Some(Role::Admin.to_string()),
            password: Some(self.password.clone()),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct Settings {
    pub bind_address: String,
    pub organization_domain: String,
    cookie_secret: Option<String>,
    pub storage: StorageBackend,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("bind_address", &self.bind_address)
            .field("organization_domain", &self.organization_domain)
            .field("storage", &self.storage)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn load() -> Result<Self, SettingsError> {
        let settings = config::Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("organization_domain", DEFAULT_ORGANIZATION_DOMAIN)?
            .set_default("storage", "postgres")?
            .add_source(config::File::with_name("inventory").required(false))
            .add_source(config::Environment::with_prefix("INVENTORY").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Key for the encrypted session cookies.
    ///
    /// Without a configured secret a random key is generated, so sessions do
    /// not survive a restart.
    pub fn cookie_key(&self) -> Result<Key, SettingsError> {
        match &self.cookie_secret {
            Some(secret) => Key::try_from(secret.as_bytes()).map_err(|_| SettingsError::CookieSecret),
            None => {
                warn!("No cookie_secret configured, generating a random session key");
                Ok(Key::generate())
            }
        }
    }
}
