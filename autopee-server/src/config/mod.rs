//! Configuration module for autopee-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;
pub mod runtime;

use crate::config::file::{FIREBASE_JWKS_URL, FileConfig};
use crate::config::runtime::{
    AdminConfig, FirebaseConfig, PaymentConfig, SepayConfig, ServerConfig, SharedConfig,
};
use autopee_core::utils::payment_code;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub sepay: SepayConfig,
    pub payment: PaymentConfig,
    pub firebase: FirebaseConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            server: Arc::new(RwLock::new(self.server)),
            admin: Arc::new(RwLock::new(self.admin)),
            sepay: Arc::new(RwLock::new(self.sepay)),
            payment: Arc::new(RwLock::new(self.payment)),
            firebase: Arc::new(RwLock::new(self.firebase)),
        }
    }

    /// Replace every section of `shared` in place.
    pub async fn apply_to(self, shared: &SharedConfig) {
        *shared.server.write().await = self.server;
        *shared.admin.write().await = self.admin;
        *shared.sepay.write().await = self.sepay;
        *shared.payment.write().await = self.payment;
        *shared.firebase.write().await = self.firebase;
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;

        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = hash_secret(&file_config.admin.secret)?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        build_loaded_config(file_config, secret_hash)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let payment = &config.payment;
    if !payment_code::is_valid_prefix(&payment.code_prefix) {
        return Err(ConfigError::ValidationError(format!(
            "payment.code_prefix {:?} must be 1-{} upper-case letters or digits",
            payment.code_prefix,
            payment_code::MAX_PREFIX_LEN
        )));
    }
    if payment.expires_in_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "payment.expires_in_minutes must be positive".to_string(),
        ));
    }
    if payment.min_amount <= rust_decimal::Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "payment.min_amount must be positive".to_string(),
        ));
    }
    if payment.min_amount > payment.max_amount {
        return Err(ConfigError::ValidationError(format!(
            "payment.min_amount {} exceeds payment.max_amount {}",
            payment.min_amount, payment.max_amount
        )));
    }
    if payment.bank_account.trim().is_empty() || payment.bank_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "payment.bank_account and payment.bank_name are required".to_string(),
        ));
    }
    if config.firebase.project_id.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "firebase.project_id is required".to_string(),
        ));
    }
    if config.sepay.api_key.as_deref().is_some_and(str::is_empty) {
        return Err(ConfigError::ValidationError(
            "sepay.api_key must not be empty; remove it to disable webhook auth".to_string(),
        ));
    }
    Ok(())
}

fn hash_secret(plaintext: &str) -> Result<String, ConfigError> {
    AdminConfig::hash_secret(plaintext).map_err(|e| ConfigError::HashError(e.to_string()))
}

fn build_loaded_config(
    file_config: FileConfig,
    secret_hash: String,
) -> Result<LoadedConfig, ConfigError> {
    let jwks_url = match file_config.firebase.jwks_url {
        Some(url) => url,
        None => Url::parse(FIREBASE_JWKS_URL)
            .map_err(|e| ConfigError::ValidationError(format!("firebase.jwks_url: {e}")))?,
    };
    let payment = file_config.payment;

    Ok(LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        admin: AdminConfig::from_hash(secret_hash)
            .map_err(|e| ConfigError::HashError(format!("admin.secret: {e}")))?,
        sepay: SepayConfig {
            api_key: file_config.sepay.api_key,
        },
        payment: PaymentConfig {
            code_prefix: payment.code_prefix,
            expires_in: time::Duration::minutes(i64::from(payment.expires_in_minutes)),
            min_amount: payment.min_amount,
            max_amount: payment.max_amount,
            bank_account: payment.bank_account,
            bank_name: payment.bank_name,
        },
        firebase: FirebaseConfig {
            project_id: file_config.firebase.project_id,
            jwks_url,
        },
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
