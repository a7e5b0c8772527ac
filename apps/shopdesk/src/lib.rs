//! # ShopDesk Application Library
//!
//! Wires configuration, the database and the services together. A UI shell
//! (desktop or web) holds one [`App`] and calls its services.
//!
//! ## Module Organization
//! ```text
//! shopdesk/
//! ├── lib.rs          ◄─── You are here (bootstrap)
//! ├── config.rs       ◄─── ShopConfig: TOML file + env overrides
//! ├── error.rs        ◄─── ApiError returned by every service call
//! ├── ports.rs        ◄─── Traits the services depend on
//! ├── adapters.rs     ◄─── Ports implemented over shopdesk-db
//! ├── state/
//! │   └── session.rs  ◄─── Checkout session behind a Mutex
//! └── services/
//!     ├── pos.rs      ◄─── Cart, totals, submit sale
//!     ├── customers.rs◄─── Customer list, check-in, messaging
//!     └── catalog.rs  ◄─── Brands, categories, suppliers
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()       RUST_LOG or "info,shopdesk=debug,sqlx=warn"    │
//! │  2. ShopConfig::load()   defaults ─► config.toml ─► SHOPDESK_* env      │
//! │  3. Database::new()      open SQLite (WAL), run migrations              │
//! │  4. App::with_database() services share one Database and one session   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod config;
pub mod error;
pub mod ports;
pub mod services;
pub mod state;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopdesk_db::{Database, DbConfig, DbError};

use crate::adapters::LogMessenger;
use crate::config::{ConfigError, ShopConfig};
use crate::ports::Messenger;
use crate::services::{CatalogService, CustomerService, PosService};
use crate::state::SessionState;

/// Startup failures.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

/// Everything a UI shell needs.
pub struct App {
    pub config: Arc<ShopConfig>,
    pub db: Database,
    pub pos: PosService,
    pub customers: CustomerService,
    pub catalog: CatalogService<Database>,
}

impl App {
    /// Opens the configured database and builds the services.
    pub async fn bootstrap(config: ShopConfig) -> Result<Self, BootstrapError> {
        config.validate()?;
        let path = config.database_path()?;
        info!(path = %path.display(), store = %config.store_name, "Bootstrapping");

        let db = Database::new(DbConfig::new(path)).await?;
        Ok(Self::with_database(config, db, Arc::new(LogMessenger)))
    }

    /// In-memory database with migrations applied. Nothing is persisted.
    pub async fn in_memory(config: ShopConfig) -> Result<Self, BootstrapError> {
        config.validate()?;
        let db = Database::new(DbConfig::in_memory()).await?;
        Ok(Self::with_database(config, db, Arc::new(LogMessenger)))
    }

    pub fn with_database(config: ShopConfig, db: Database, messenger: Arc<dyn Messenger>) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(db.clone());

        let pos = PosService::new(store.clone(), store.clone(), SessionState::new(), config.clone());
        let customers = CustomerService::new(store.clone(), messenger, config.clone());
        let catalog = CatalogService::new(store);

        App {
            config,
            db,
            pos,
            customers,
            catalog,
        }
    }
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Safe to call more than once.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,shopdesk=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
