//! # shopdesk-db: Database Layer for ShopDesk
//!
//! SQLite storage for the shop: customers, the catalog (brands, categories,
//! suppliers), products with their variants, and sale orders.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ShopDesk Data Flow                               │
//! │                                                                         │
//! │  PosService::submit_sale (apps/shopdesk)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    shopdesk-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ CustomerRepo   │   │              │   │   │
//! │  │   │ SqlitePool    │◄───│ Brand/Category │   │ 001_initial  │   │   │
//! │  │   │ WAL, FKs on   │    │ SupplierRepo   │   │ _schema.sql  │   │   │
//! │  │   │               │    │ Product/Order  │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/shopdesk.db                                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and repository accessors
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopdesk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/shopdesk.db")).await?;
//!
//! let brands = db.brands().list_active().await?;
//! let hits = db.products().search_for_sale("charger", 20).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::brand::BrandRepository;
pub use repository::category::CategoryRepository;
pub use repository::customer::CustomerRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::supplier::SupplierRepository;
