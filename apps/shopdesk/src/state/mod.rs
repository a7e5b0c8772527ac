//! # State Module
//!
//! Mutable state owned by the app. Configuration is read-only after startup
//! and lives in [`crate::config`]; the database pool is internally
//! synchronised. That leaves the checkout session.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │   Database   │  │   SessionState   │  │   ShopConfig     │          │
//! │  │  SqlitePool  │  │  Arc<Mutex<      │  │  read-only       │          │
//! │  │  (Clone)     │  │    Checkout>>    │  │  (Arc)           │          │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  The session lock is held only for synchronous sections and never       │
//! │  across an `.await`.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod session;

pub use session::SessionState;
