//! In-memory port implementations for service tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shopdesk_core::catalog::{Brand, BrandInput};
use shopdesk_core::customer::{Customer, CustomerInput, CustomerNote, MessageChannel};
use shopdesk_core::order::{SaleOrder, SaleOrderDraft, SalesPeriod, SalesStats};
use shopdesk_core::product::SaleableProduct;
use shopdesk_core::{CustomerType, Money, RecordStatus, SoftDelete};
use shopdesk_db::{DbError, DbResult};

use crate::ports::{CatalogStore, CustomerStore, MessageError, Messenger, OrderGateway, ProductStore};

pub fn saleable(product_id: &str, variant_id: &str, price: i64) -> SaleableProduct {
    SaleableProduct {
        product_id: product_id.to_string(),
        variant_id: Some(variant_id.to_string()),
        name: format!("Product {}", product_id),
        variant_label: None,
        brand_name: None,
        sku: None,
        selling_price: Money::from_minor(price),
        wholesale_price: None,
        cost_price: None,
        stock_quantity: 10,
    }
}

pub fn customer(id: &str, name: &str, phone: &str) -> Customer {
    Customer {
        id: id.to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        email: None,
        whatsapp: None,
        city: None,
        customer_type: CustomerType::Retail,
        loyalty_level: None,
        color_tag: None,
        referral_source: None,
        points: 0,
        total_spent: None,
        payments: Vec::new(),
        notes: Vec::new(),
        birth_month: None,
        birth_day: None,
        is_active: true,
        is_read: false,
        joined_at: Utc::now(),
        last_visit_at: None,
    }
}

#[derive(Default)]
struct State {
    products: Vec<SaleableProduct>,
    inactive: HashSet<String>,
    orders: Vec<SaleOrder>,
    customers: Vec<Customer>,
    brands: Vec<Brand>,
    sent: Vec<(MessageChannel, String, String)>,
    fail_orders: bool,
    offline: bool,
}

/// Every port backed by one mutex-guarded state.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn with_products(products: Vec<SaleableProduct>) -> Self {
        let backend = FakeBackend::default();
        backend.state.lock().unwrap().products = products;
        backend
    }

    pub fn with_customers(customers: Vec<Customer>) -> Self {
        let backend = FakeBackend::default();
        backend.state.lock().unwrap().customers = customers;
        backend
    }

    pub fn deactivate(&self, product_id: &str) {
        self.state.lock().unwrap().inactive.insert(product_id.to_string());
    }

    pub fn fail_orders(&self) {
        self.state.lock().unwrap().fail_orders = true;
    }

    /// Every store call fails from now on.
    pub fn go_offline(&self) {
        self.state.lock().unwrap().offline = true;
    }

    pub fn orders_created(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    pub fn sent(&self) -> Vec<(MessageChannel, String, String)> {
        self.state.lock().unwrap().sent.clone()
    }

    fn check_online(&self) -> DbResult<()> {
        if self.state.lock().unwrap().offline {
            return Err(DbError::ConnectionFailed("offline".into()));
        }
        Ok(())
    }

    fn find_product(&self, product_id: &str, variant_id: Option<&str>) -> Option<SaleableProduct> {
        let state = self.state.lock().unwrap();
        if state.inactive.contains(product_id) {
            return None;
        }
        state
            .products
            .iter()
            .find(|p| {
                p.product_id == product_id
                    && variant_id.map_or(true, |v| p.variant_id.as_deref() == Some(v))
            })
            .cloned()
    }
}

#[async_trait]
impl ProductStore for FakeBackend {
    async fn search_for_sale(&self, query: &str, limit: u32) -> DbResult<Vec<SaleableProduct>> {
        self.check_online()?;
        let query = query.to_lowercase();
        let state = self.state.lock().unwrap();
        Ok(state
            .products
            .iter()
            .filter(|p| !state.inactive.contains(&p.product_id))
            .filter(|p| p.name.to_lowercase().contains(&query))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_saleable(
        &self,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> DbResult<Option<SaleableProduct>> {
        self.check_online()?;
        Ok(self.find_product(product_id, variant_id))
    }

    async fn is_line_available(&self, product_id: &str, variant_id: Option<&str>) -> DbResult<bool> {
        self.check_online()?;
        Ok(self.find_product(product_id, variant_id).is_some())
    }

    async fn price_for(&self, variant_id: &str, customer_type: CustomerType) -> DbResult<Money> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        state
            .products
            .iter()
            .filter(|p| !state.inactive.contains(&p.product_id))
            .find(|p| p.variant_id.as_deref() == Some(variant_id))
            .map(|p| p.price_for(customer_type))
            .ok_or_else(|| DbError::not_found("ProductVariant", variant_id))
    }
}

#[async_trait]
impl OrderGateway for FakeBackend {
    async fn create_sale_order(&self, draft: &SaleOrderDraft) -> DbResult<SaleOrder> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        if state.fail_orders {
            return Err(DbError::TransactionFailed("backend rejected the order".into()));
        }
        let order = SaleOrder {
            id: Uuid::new_v4().to_string(),
            order_number: format!("SO-TEST-{:04}", state.orders.len() + 1),
            customer_id: draft.customer_id.clone(),
            customer_type: draft.customer_type,
            lines: draft.lines.clone(),
            totals: draft.totals,
            payment_method: draft.payment_method,
            delivery: draft.delivery.clone(),
            status: draft.status,
            created_by: draft.created_by.clone(),
            created_at: Utc::now(),
        };
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn sales_stats(&self, period: SalesPeriod, now: DateTime<Utc>) -> DbResult<SalesStats> {
        self.check_online()?;
        let start = period.start(now);
        let state = self.state.lock().unwrap();
        Ok(SalesStats::from_orders(
            state
                .orders
                .iter()
                .filter(|o| start.map_or(true, |s| o.created_at >= s)),
        ))
    }
}

#[async_trait]
impl CustomerStore for FakeBackend {
    async fn list_customers(&self) -> DbResult<Vec<Customer>> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().customers.clone())
    }

    async fn get_customer(&self, id: &str) -> DbResult<Option<Customer>> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        Ok(state.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn create_customer(&self, input: &CustomerInput) -> DbResult<Customer> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        if state.customers.iter().any(|c| c.phone == input.phone) {
            return Err(DbError::duplicate("phone", &input.phone));
        }
        let mut created = customer(&Uuid::new_v4().to_string(), &input.name, &input.phone);
        created.email = input.email.clone();
        created.whatsapp = input.whatsapp.clone();
        created.city = input.city.clone();
        created.customer_type = input.customer_type;
        state.customers.push(created.clone());
        Ok(created)
    }

    async fn update_customer(&self, id: &str, input: &CustomerInput) -> DbResult<Customer> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DbError::not_found("Customer", id))?;
        existing.name = input.name.clone();
        existing.phone = input.phone.clone();
        existing.whatsapp = input.whatsapp.clone();
        Ok(existing.clone())
    }

    async fn mark_as_read(&self, id: &str) -> DbResult<()> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DbError::not_found("Customer", id))?;
        existing.is_read = true;
        Ok(())
    }

    async fn check_in(&self, id: &str, points: i64) -> DbResult<Customer> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DbError::not_found("Customer", id))?;
        existing.points += points;
        existing.last_visit_at = Some(Utc::now());
        Ok(existing.clone())
    }

    async fn add_note(&self, id: &str, content: &str, created_by: Option<&str>) -> DbResult<CustomerNote> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DbError::not_found("Customer", id))?;
        let note = CustomerNote {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            created_by: created_by.map(str::to_string),
            created_at: Utc::now(),
        };
        existing.notes.push(note.clone());
        Ok(note)
    }
}

#[async_trait]
impl CatalogStore<Brand> for FakeBackend {
    async fn list_active(&self) -> DbResult<Vec<Brand>> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        Ok(state.brands.iter().filter(|b| b.is_active()).cloned().collect())
    }

    async fn list_all(&self) -> DbResult<Vec<Brand>> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().brands.clone())
    }

    async fn get(&self, id: &str) -> DbResult<Option<Brand>> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        Ok(state.brands.iter().find(|b| b.id == id).cloned())
    }

    async fn search(&self, text: &str) -> DbResult<Vec<Brand>> {
        self.check_online()?;
        let text = text.to_lowercase();
        let state = self.state.lock().unwrap();
        Ok(state
            .brands
            .iter()
            .filter(|b| b.is_active() && b.name.to_lowercase().contains(&text))
            .cloned()
            .collect())
    }

    async fn create(&self, input: &BrandInput) -> DbResult<Brand> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        if state.brands.iter().any(|b| b.name.eq_ignore_ascii_case(&input.name)) {
            return Err(DbError::duplicate("brand name", &input.name));
        }
        let now = Utc::now();
        let brand = Brand {
            id: Uuid::new_v4().to_string(),
            name: input.name.clone(),
            description: input.description.clone(),
            website: input.website.clone(),
            categories: input.categories.clone(),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };
        state.brands.push(brand.clone());
        Ok(brand)
    }

    async fn update(&self, id: &str, input: &BrandInput) -> DbResult<Brand> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let brand = state
            .brands
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| DbError::not_found("Brand", id))?;
        brand.name = input.name.clone();
        brand.categories = input.categories.clone();
        brand.updated_at = Utc::now();
        Ok(brand.clone())
    }

    async fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> DbResult<()> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let brand = state
            .brands
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| DbError::not_found("Brand", id))?;
        brand.status = RecordStatus::Deleted { deleted_at: at };
        Ok(())
    }

    async fn restore(&self, id: &str) -> DbResult<()> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let brand = state
            .brands
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| DbError::not_found("Brand", id))?;
        brand.status = RecordStatus::Active;
        Ok(())
    }
}

#[async_trait]
impl Messenger for FakeBackend {
    async fn send(&self, channel: MessageChannel, to: &str, text: &str) -> Result<(), MessageError> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(MessageError::Unavailable);
        }
        state.sent.push((channel, to.to_string(), text.to_string()));
        Ok(())
    }
}
