//! Application state container shared across Axum route handlers and services.
//!
//! Holds the database connection and the configuration loaded at start-up.
//! Both are cheap to clone, so handlers receive it through `State<AppState>`.

use crate::config::AppConfig;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Central application state shared across the server.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    config: Arc<AppConfig>,
}

impl AppState {
    /// Creates a new `AppState` from an open connection and a loaded config.
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns the configuration injected at start-up.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns a cloned copy of the database connection.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }
}
