//! # Checkout
//!
//! The POS session: cart plus everything the checkout panel collects, and
//! the state machine that guards sale submission.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────┐  customer selected AND cart non-empty   ┌────────────────┐  │
//! │   │ Idle │ ──────────────────────────────────────► │ ReadyToSubmit  │  │
//! │   └──────┘ ◄────────────────────────────────────── └───────┬────────┘  │
//! │       ▲        customer cleared OR cart emptied            │           │
//! │       │                                       begin_submit │           │
//! │       │                                                    ▼           │
//! │       │                                           ┌────────────────┐   │
//! │       │                         fail(message) ◄── │   Submitting   │   │
//! │       │                      (back to Ready,      └───────┬────────┘   │
//! │       │                       cart untouched)             │ complete   │
//! │       │                                                    ▼           │
//! │       │            next edit                      ┌────────────────┐   │
//! │       └────────────────────────────────────────── │   Completed    │   │
//! │                                                   └────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guards
//! `begin_submit` checks, in order: customer selected, cart non-empty,
//! amount paid not negative. A failed guard leaves the session unchanged.
//! While `Submitting`, every edit is refused with
//! [`CoreError::CheckoutInProgress`]; there is no automatic retry.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartItem, ExternalProduct, LineKey};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::order::{initial_status, DeliveryDetails, Receipt, SaleOrder, SaleOrderDraft, SaleOrderLine};
use crate::product::SaleableProduct;
use crate::totals::{Discount, OrderTotals, PricingConfig, PricingParams};
use crate::types::{CustomerType, PaymentMethod};

/// Observable phase of the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CheckoutPhase {
    Idle,
    ReadyToSubmit,
    Submitting,
    Completed,
}

/// The customer attached to the sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Stage {
    #[default]
    Editing,
    Submitting,
    Completed,
}

/// A POS checkout session.
#[derive(Debug, Clone, Default)]
pub struct Checkout {
    cart: Cart,
    customer: Option<CustomerRef>,
    customer_type: CustomerType,
    payment_method: PaymentMethod,
    delivery: DeliveryDetails,
    shipping_quote: Option<Money>,
    discount: Discount,
    amount_paid: Money,
    created_by: Option<String>,
    stage: Stage,
    last_error: Option<String>,
    last_receipt: Option<Receipt>,
}

impl Checkout {
    pub fn new() -> Self {
        Checkout::default()
    }

    /// Session for a signed-in staff member.
    pub fn for_staff(created_by: impl Into<String>) -> Self {
        Checkout {
            created_by: Some(created_by.into()),
            ..Checkout::default()
        }
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    pub fn phase(&self) -> CheckoutPhase {
        match self.stage {
            Stage::Submitting => CheckoutPhase::Submitting,
            Stage::Completed => CheckoutPhase::Completed,
            Stage::Editing if self.customer.is_some() && !self.cart.is_empty() => {
                CheckoutPhase::ReadyToSubmit
            }
            Stage::Editing => CheckoutPhase::Idle,
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn customer(&self) -> Option<&CustomerRef> {
        self.customer.as_ref()
    }

    pub fn customer_type(&self) -> CustomerType {
        self.customer_type
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn delivery(&self) -> &DeliveryDetails {
        &self.delivery
    }

    pub fn discount(&self) -> Discount {
        self.discount
    }

    pub fn amount_paid(&self) -> Money {
        self.amount_paid
    }

    /// Message of the last failed submission, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Receipt of the last completed sale.
    pub fn last_receipt(&self) -> Option<&Receipt> {
        self.last_receipt.as_ref()
    }

    pub fn pricing(&self, config: PricingConfig) -> PricingParams {
        PricingParams {
            config,
            discount: self.discount,
            delivery_method: self.delivery.method,
            shipping_quote: self.shipping_quote,
            amount_paid: self.amount_paid,
        }
    }

    /// Live totals for the checkout panel.
    pub fn totals(&self, config: PricingConfig) -> CoreResult<OrderTotals> {
        OrderTotals::compute(self.cart.items(), &self.pricing(config))
    }

    // =========================================================================
    // Edits
    // =========================================================================

    fn edit(&mut self) -> CoreResult<&mut Self> {
        if self.stage == Stage::Submitting {
            return Err(CoreError::CheckoutInProgress);
        }
        self.stage = Stage::Editing;
        Ok(self)
    }

    pub fn add_product(&mut self, product: &SaleableProduct, quantity: i64) -> CoreResult<()> {
        let this = self.edit()?;
        let customer_type = this.customer_type;
        this.cart.add_product(product, customer_type, quantity)
    }

    pub fn add_external(&mut self, product: &ExternalProduct) -> CoreResult<LineKey> {
        self.edit()?.cart.add_external(product)
    }

    pub fn update_quantity(&mut self, key: &LineKey, quantity: i64) -> CoreResult<()> {
        self.edit()?.cart.update_quantity(key, quantity)
    }

    pub fn remove_item(&mut self, key: &LineKey) -> CoreResult<CartItem> {
        self.edit()?.cart.remove_item(key)
    }

    /// Drops lines for which `keep` is false and returns them.
    pub fn retain_lines<F>(&mut self, keep: F) -> CoreResult<Vec<CartItem>>
    where
        F: FnMut(&CartItem) -> bool,
    {
        Ok(self.edit()?.cart.retain_lines(keep))
    }

    pub fn select_customer(&mut self, customer: Option<CustomerRef>) -> CoreResult<()> {
        self.edit()?.customer = customer;
        Ok(())
    }

    /// Switches the price list for lines added from now on.
    pub fn set_customer_type(&mut self, customer_type: CustomerType) -> CoreResult<()> {
        self.edit()?.customer_type = customer_type;
        Ok(())
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) -> CoreResult<()> {
        self.edit()?.payment_method = method;
        Ok(())
    }

    pub fn set_delivery(&mut self, delivery: DeliveryDetails, quote: Option<Money>) -> CoreResult<()> {
        let this = self.edit()?;
        this.delivery = delivery;
        this.shipping_quote = quote;
        Ok(())
    }

    pub fn set_discount(&mut self, discount: Discount) -> CoreResult<()> {
        self.edit()?.discount = discount;
        Ok(())
    }

    /// Records the amount tendered. Negative values are accepted here and
    /// rejected at submission so the field can be edited freely.
    pub fn set_amount_paid(&mut self, amount: Money) -> CoreResult<()> {
        self.edit()?.amount_paid = amount;
        Ok(())
    }

    /// Empties the cart and resets payment and delivery fields.
    pub fn clear(&mut self) -> CoreResult<()> {
        self.edit()?;
        self.reset_sale();
        self.last_error = None;
        Ok(())
    }

    fn reset_sale(&mut self) {
        self.cart.clear();
        self.customer = None;
        self.customer_type = CustomerType::default();
        self.payment_method = PaymentMethod::default();
        self.delivery = DeliveryDetails::default();
        self.shipping_quote = None;
        self.discount = Discount::None;
        self.amount_paid = Money::zero();
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// ReadyToSubmit → Submitting. Returns the order to send to the backend.
    pub fn begin_submit(&mut self, config: PricingConfig) -> CoreResult<SaleOrderDraft> {
        if self.stage == Stage::Submitting {
            return Err(CoreError::CheckoutInProgress);
        }
        let customer = self.customer.as_ref().ok_or(CoreError::MissingCustomer)?;
        if self.cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        if self.amount_paid.is_negative() {
            return Err(CoreError::NegativePayment);
        }

        let totals = self.totals(config)?;
        let draft = SaleOrderDraft {
            customer_id: customer.id.clone(),
            customer_type: self.customer_type,
            lines: self
                .cart
                .items()
                .iter()
                .map(SaleOrderLine::try_from)
                .collect::<CoreResult<Vec<_>>>()?,
            totals,
            payment_method: self.payment_method,
            delivery: self.delivery.clone(),
            status: initial_status(&totals, self.payment_method),
            created_by: self.created_by.clone(),
        };

        self.stage = Stage::Submitting;
        self.last_error = None;
        Ok(draft)
    }

    /// Submitting → Completed. Resets the sale and keeps the receipt.
    pub fn complete(&mut self, order: &SaleOrder, store_name: &str) -> CoreResult<&Receipt> {
        if self.stage != Stage::Submitting {
            return Err(CoreError::NotSubmitting);
        }
        let customer_name = self
            .customer
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_default();

        self.reset_sale();
        self.stage = Stage::Completed;
        self.last_error = None;
        Ok(self
            .last_receipt
            .insert(Receipt::from_order(order, store_name, &customer_name)))
    }

    /// Submitting → ReadyToSubmit with the error kept for display.
    pub fn fail(&mut self, message: impl Into<String>) -> CoreResult<()> {
        if self.stage != Stage::Submitting {
            return Err(CoreError::NotSubmitting);
        }
        self.stage = Stage::Editing;
        self.last_error = Some(message.into());
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeliveryMethod, OrderStatus};
    use chrono::Utc;

    fn laptop() -> SaleableProduct {
        SaleableProduct {
            product_id: "p-laptop".into(),
            variant_id: Some("v-16gb".into()),
            name: "ThinkPad".into(),
            variant_label: Some("16GB".into()),
            brand_name: Some("Lenovo".into()),
            sku: None,
            selling_price: Money::from_minor(1_500_000),
            wholesale_price: Some(Money::from_minor(1_400_000)),
            cost_price: Some(Money::from_minor(1_200_000)),
            stock_quantity: 4,
        }
    }

    fn amina() -> CustomerRef {
        CustomerRef {
            id: "c-1".into(),
            name: "Amina".into(),
            phone: None,
        }
    }

    fn order_from(draft: &SaleOrderDraft) -> SaleOrder {
        SaleOrder {
            id: "o-1".into(),
            order_number: "SO-20240314-0001".into(),
            customer_id: draft.customer_id.clone(),
            customer_type: draft.customer_type,
            lines: draft.lines.clone(),
            totals: draft.totals,
            payment_method: draft.payment_method,
            delivery: draft.delivery.clone(),
            status: draft.status,
            created_by: draft.created_by.clone(),
            created_at: Utc::now(),
        }
    }

    fn ready() -> Checkout {
        let mut c = Checkout::for_staff("cashier-1");
        c.select_customer(Some(amina())).unwrap();
        c.add_product(&laptop(), 1).unwrap();
        c
    }

    #[test]
    fn test_idle_until_customer_and_cart() {
        let mut c = Checkout::new();
        assert_eq!(c.phase(), CheckoutPhase::Idle);
        c.add_product(&laptop(), 1).unwrap();
        assert_eq!(c.phase(), CheckoutPhase::Idle);
        c.select_customer(Some(amina())).unwrap();
        assert_eq!(c.phase(), CheckoutPhase::ReadyToSubmit);
        c.update_quantity(&LineKey::catalog("p-laptop", Some("v-16gb".into())), 0)
            .unwrap();
        assert_eq!(c.phase(), CheckoutPhase::Idle);
    }

    #[test]
    fn test_guards_in_order_without_state_change() {
        let mut c = Checkout::new();
        assert!(matches!(
            c.begin_submit(PricingConfig::default()),
            Err(CoreError::MissingCustomer)
        ));

        c.select_customer(Some(amina())).unwrap();
        assert!(matches!(
            c.begin_submit(PricingConfig::default()),
            Err(CoreError::EmptyCart)
        ));

        c.add_product(&laptop(), 1).unwrap();
        c.set_amount_paid(Money::from_minor(-1)).unwrap();
        let err = c.begin_submit(PricingConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "Amount paid cannot be negative");
        assert_eq!(c.phase(), CheckoutPhase::ReadyToSubmit);
        assert_eq!(c.cart().item_count(), 1);
    }

    #[test]
    fn test_draft_carries_totals_and_status() {
        let mut c = ready();
        c.set_amount_paid(Money::from_minor(1_000_000)).unwrap();
        let draft = c.begin_submit(PricingConfig::default()).unwrap();

        assert_eq!(draft.customer_id, "c-1");
        assert_eq!(draft.created_by.as_deref(), Some("cashier-1"));
        assert_eq!(draft.totals.total.minor(), 1_740_000);
        assert_eq!(draft.totals.balance.minor(), 740_000);
        assert_eq!(draft.status, OrderStatus::PartiallyPaid);
        assert_eq!(draft.lines[0].unit_cost, Some(Money::from_minor(1_200_000)));
        assert_eq!(c.phase(), CheckoutPhase::Submitting);
    }

    #[test]
    fn test_double_submit_and_edits_rejected_while_submitting() {
        let mut c = ready();
        c.begin_submit(PricingConfig::default()).unwrap();

        assert!(matches!(
            c.begin_submit(PricingConfig::default()),
            Err(CoreError::CheckoutInProgress)
        ));
        assert!(matches!(
            c.add_product(&laptop(), 1),
            Err(CoreError::CheckoutInProgress)
        ));
        assert!(matches!(c.clear(), Err(CoreError::CheckoutInProgress)));
        assert_eq!(c.cart().total_quantity(), 1);
    }

    #[test]
    fn test_complete_resets_and_keeps_receipt() {
        let mut c = ready();
        c.set_delivery(
            DeliveryDetails {
                method: DeliveryMethod::BusCargo,
                address: Some("Plot 12".into()),
                city: Some("Mbeya".into()),
                notes: None,
            },
            None,
        )
        .unwrap();
        c.set_amount_paid(Money::from_minor(2_000_000)).unwrap();
        let draft = c.begin_submit(PricingConfig::default()).unwrap();
        assert_eq!(draft.totals.shipping.minor(), 500);

        let receipt = c.complete(&order_from(&draft), "Fundi Electronics").unwrap();
        assert_eq!(receipt.customer_name, "Amina");
        assert_eq!(receipt.change_due.minor(), 259_500);

        assert_eq!(c.phase(), CheckoutPhase::Completed);
        assert!(c.cart().is_empty());
        assert!(c.customer().is_none());
        assert!(c.amount_paid().is_zero());
        assert_eq!(c.delivery(), &DeliveryDetails::default());
        assert!(c.last_receipt().is_some());
    }

    #[test]
    fn test_fail_returns_to_ready_with_cart_intact() {
        let mut c = ready();
        c.begin_submit(PricingConfig::default()).unwrap();
        c.fail("Failed to process sale").unwrap();

        assert_eq!(c.phase(), CheckoutPhase::ReadyToSubmit);
        assert_eq!(c.last_error(), Some("Failed to process sale"));
        assert_eq!(c.cart().item_count(), 1);
        assert!(c.last_receipt().is_none());
    }

    #[test]
    fn test_complete_or_fail_without_submission() {
        let mut c = ready();
        assert!(matches!(c.fail("x"), Err(CoreError::NotSubmitting)));
        let draft = {
            let mut other = ready();
            other.begin_submit(PricingConfig::default()).unwrap()
        };
        assert!(matches!(
            c.complete(&order_from(&draft), "Shop"),
            Err(CoreError::NotSubmitting)
        ));
    }

    #[test]
    fn test_next_edit_after_completion_starts_new_sale() {
        let mut c = ready();
        let draft = c.begin_submit(PricingConfig::default()).unwrap();
        c.complete(&order_from(&draft), "Shop").unwrap();
        c.add_product(&laptop(), 1).unwrap();
        assert_eq!(c.phase(), CheckoutPhase::Idle);
    }

    #[test]
    fn test_wholesale_customer_type_prices_new_lines() {
        let mut c = Checkout::new();
        c.set_customer_type(CustomerType::Wholesale).unwrap();
        c.add_product(&laptop(), 1).unwrap();
        assert_eq!(c.cart().subtotal().unwrap().minor(), 1_400_000);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut c = ready();
        c.set_discount(Discount::Percentage(500)).unwrap();
        c.set_payment_method(PaymentMethod::MobileMoney).unwrap();
        c.clear().unwrap();

        assert_eq!(c.phase(), CheckoutPhase::Idle);
        assert!(c.discount().is_none());
        assert_eq!(c.payment_method(), PaymentMethod::Cash);
    }
}
