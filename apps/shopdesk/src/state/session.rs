//! # Checkout Session
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier Action          PosService              Checkout change        │
//! │  ──────────────          ──────────              ───────────────        │
//! │                                                                         │
//! │  Click product ────────► add_to_cart() ───────► cart line merged/added  │
//! │  Change quantity ──────► update_quantity() ───► qty set, 0 removes      │
//! │  Pick customer ────────► select_customer() ───► Idle → ReadyToSubmit    │
//! │  Complete sale ────────► submit_sale() ───────► Submitting → Completed  │
//! │                                                  or back, with error    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use shopdesk_core::Checkout;

/// Shared handle to one cashier's checkout.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    checkout: Arc<Mutex<Checkout>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session stamped with the staff member who rings up sales.
    pub fn for_staff(created_by: impl Into<String>) -> Self {
        SessionState {
            checkout: Arc::new(Mutex::new(Checkout::for_staff(created_by))),
        }
    }

    /// Runs `f` with read access to the checkout.
    ///
    /// A poisoned lock is recovered; `Checkout` has no invariant a panic in
    /// a reader could break.
    pub fn with_checkout<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Checkout) -> R,
    {
        let checkout = self.checkout.lock().unwrap_or_else(|e| e.into_inner());
        f(&checkout)
    }

    /// Runs `f` with write access to the checkout.
    pub fn with_checkout_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Checkout) -> R,
    {
        let mut checkout = self.checkout.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut checkout)
    }
}
