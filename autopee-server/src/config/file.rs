//! TOML file configuration structures.
//!
//! These structs directly map to the `autopee-config.toml` file format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub sepay: SepayConfig,
    pub payment: PaymentConfig,
    pub firebase: FirebaseConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// SePay webhook configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SepayConfig {
    /// Expected `Authorization: Apikey <key>`. Webhooks are unauthenticated
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Deposit policy and receiving bank account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,
    #[serde(default = "default_expires_in_minutes")]
    pub expires_in_minutes: u32,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub bank_account: String,
    pub bank_name: String,
}

fn default_code_prefix() -> String {
    "AP".to_string()
}

fn default_expires_in_minutes() -> u32 {
    30
}

/// Firebase project used to verify ID tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    pub project_id: String,
    /// Defaults to [`FIREBASE_JWKS_URL`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_url: Option<Url>,
}

/// Google's public keys for Firebase ID tokens.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        self.admin.secret.starts_with("$argon2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "test-secret"

[sepay]
api_key = "sepay-key"

[payment]
code_prefix = "AP"
expires_in_minutes = 15
min_amount = 10000
max_amount = 50000000
bank_account = "0123499999"
bank_name = "MBBank"

[firebase]
project_id = "autopee-dev"
"#;

    #[test]
    fn test_config_parsing() {
        let config: FileConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.sepay.api_key.as_deref(), Some("sepay-key"));
        assert_eq!(config.payment.expires_in_minutes, 15);
        assert_eq!(config.payment.min_amount, Decimal::from(10_000));
        assert!(config.firebase.jwks_url.is_none());
        assert!(!config.is_admin_secret_hashed());
    }

    #[test]
    fn test_optional_sections_default() {
        let toml_str = r#"
[admin]
secret = "$argon2id$v=19$m=19456,t=2,p=1$abc123"

[payment]
min_amount = 10000
max_amount = 20000
bank_account = "1"
bank_name = "VCB"

[firebase]
project_id = "p"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert!(config.sepay.api_key.is_none());
        assert_eq!(config.payment.code_prefix, "AP");
        assert_eq!(config.payment.expires_in_minutes, 30);
        assert!(config.is_admin_secret_hashed());
    }

    #[test]
    fn test_round_trip_keeps_unset_api_key_absent() {
        let mut config: FileConfig = toml::from_str(SAMPLE).unwrap();
        config.sepay.api_key = None;
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(!rendered.contains("api_key"));
    }
}
