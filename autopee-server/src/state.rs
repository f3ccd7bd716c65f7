//! Application state shared across all request handlers.

use crate::auth::FirebaseVerifier;
use crate::config::runtime::SharedConfig;
use autopee_core::framework::DatabaseProcessor;
use autopee_core::ledger::PgLedger;
use autopee_core::processor::TransactionProcessor;
use sqlx::PgPool;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Runtime configuration (each section can be reloaded via SIGHUP).
    pub config: SharedConfig,
    /// Firebase ID token verifier with its signing-key cache.
    pub firebase: Arc<FirebaseVerifier>,
    /// Webhook ingestion and manual reconciliation.
    pub transactions: Arc<TransactionProcessor<PgLedger>>,
}

impl AppState {
    pub fn new(db: PgPool, config: SharedConfig, http: reqwest::Client) -> Self {
        Self {
            transactions: Arc::new(TransactionProcessor::new(PgLedger::new(db.clone()))),
            firebase: Arc::new(FirebaseVerifier::new(http)),
            db,
            config,
        }
    }

    pub fn processor(&self) -> DatabaseProcessor {
        DatabaseProcessor::new(self.db.clone())
    }
}
