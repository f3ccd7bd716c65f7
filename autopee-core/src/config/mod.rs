//! Configuration types for the Autopee wallet service.
//!
//! These types represent the validated runtime configuration used by the server.
//! Loading and parsing the TOML file is handled by the server crate.

mod admin;
mod firebase;
mod payment;
mod sepay;
mod server;

pub use admin::AdminConfig;
pub use firebase::FirebaseConfig;
pub use payment::PaymentConfig;
pub use sepay::SepayConfig;
pub use server::ServerConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
///
/// This allows independent access to different configuration sections
/// without blocking other readers/writers.
#[derive(Clone)]
pub struct SharedConfig {
    pub server: Arc<RwLock<ServerConfig>>,
    pub admin: Arc<RwLock<AdminConfig>>,
    pub sepay: Arc<RwLock<SepayConfig>>,
    pub payment: Arc<RwLock<PaymentConfig>>,
    pub firebase: Arc<RwLock<FirebaseConfig>>,
}
