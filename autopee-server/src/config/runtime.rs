//! Runtime configuration re-exports.
//!
//! The validated config types live in `autopee_core::config`.

pub use autopee_core::config::{
    AdminConfig, FirebaseConfig, PaymentConfig, SepayConfig, ServerConfig, SharedConfig,
};
