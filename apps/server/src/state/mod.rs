//! # State Module
//!
//! Shared state handed to every axum handler.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐                   │
//! │  │   Database   │  │  JwtManager  │  │  AppConfig   │                   │
//! │  │  (SQLite     │  │  (signing    │  │  (read-only) │                   │
//! │  │   pool)      │  │   key)       │  │              │                   │
//! │  └──────────────┘  └──────────────┘  └──────────────┘                   │
//! │                                                                         │
//! │  ┌──────────────────────────┐  ┌──────────────────────────┐             │
//! │  │  Arc<Mutex<ScanBridge>>  │  │ Arc<Mutex<RevokedTokens>>│             │
//! │  └──────────────────────────┘  └──────────────────────────┘             │
//! │                                                                         │
//! │  THREAD SAFETY:                                                         │
//! │  • Database has an internal connection pool                             │
//! │  • Mutex-guarded parts are never held across an .await                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod scans;
mod sessions;

pub use scans::ScanBridge;
pub use sessions::RevokedTokens;

use std::sync::{Arc, Mutex};

use tally_db::Database;

use crate::auth::JwtManager;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<AppConfig>,
    scans: Arc<Mutex<ScanBridge>>,
    revoked: Arc<Mutex<RevokedTokens>>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let jwt = JwtManager::new(config.auth.jwt_secret.clone(), config.auth.session_ttl_secs);
        let scans = ScanBridge::new(config.scan.buffer_size, config.scan.cooldown_ms);

        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
            scans: Arc::new(Mutex::new(scans)),
            revoked: Arc::new(Mutex::new(RevokedTokens::new())),
        }
    }

    /// Executes a function with write access to the scan bridge.
    pub fn with_scans<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ScanBridge) -> R,
    {
        let mut scans = self.scans.lock().expect("Scan bridge mutex poisoned");
        f(&mut scans)
    }

    /// Executes a function with write access to the revoked-token list.
    pub fn with_revoked<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut RevokedTokens) -> R,
    {
        let mut revoked = self.revoked.lock().expect("Revoked token mutex poisoned");
        f(&mut revoked)
    }
}
