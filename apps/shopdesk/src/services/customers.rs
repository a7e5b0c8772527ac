//! # Customer Service
//!
//! The customer list page and the customer drawer: filter and sort, edits,
//! check-ins, notes and outbound messages.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use shopdesk_core::customer::{
    filter_customers, Customer, CustomerFilter, CustomerInput, CustomerNote, CustomerSort, CustomerStats,
    MessageChannel,
};
use shopdesk_core::validation::validate_optional_text;
use shopdesk_core::ValidationError;

use crate::config::ShopConfig;
use crate::error::ApiError;
use crate::ports::{CustomerStore, Messenger};

const MAX_NOTE_LEN: usize = 2000;

pub struct CustomerService {
    store: Arc<dyn CustomerStore>,
    messenger: Arc<dyn Messenger>,
    config: Arc<ShopConfig>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn CustomerStore>, messenger: Arc<dyn Messenger>, config: Arc<ShopConfig>) -> Self {
        CustomerService {
            store,
            messenger,
            config,
        }
    }

    /// The visible customer list. Filtering happens in memory over the full
    /// fetch so the page can refilter without another round trip.
    pub async fn list(
        &self,
        filter: &CustomerFilter,
        sort: Option<CustomerSort>,
    ) -> Result<Vec<Customer>, ApiError> {
        let all = self.store.list_customers().await?;
        let view = filter_customers(&all, filter, sort, Utc::now());
        debug!(total = all.len(), shown = view.len(), "list customers");
        Ok(view)
    }

    /// Customers who have not visited within the configured window.
    pub async fn list_inactive(&self) -> Result<Vec<Customer>, ApiError> {
        let filter = CustomerFilter {
            inactive_for_days: Some(self.config.inactive_after_days),
            ..CustomerFilter::default()
        };
        self.list(&filter, Some(CustomerSort::Spent)).await
    }

    pub async fn get(&self, id: &str) -> Result<Customer, ApiError> {
        self.store
            .get_customer(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Customer", id))
    }

    pub async fn create(&self, input: CustomerInput) -> Result<Customer, ApiError> {
        input.validate()?;
        let customer = self.store.create_customer(&input).await?;
        info!(id = %customer.id, name = %customer.name, "Customer created");
        Ok(customer)
    }

    pub async fn update(&self, id: &str, input: CustomerInput) -> Result<Customer, ApiError> {
        input.validate()?;
        Ok(self.store.update_customer(id, &input).await?)
    }

    pub async fn mark_as_read(&self, id: &str) -> Result<(), ApiError> {
        Ok(self.store.mark_as_read(id).await?)
    }

    /// Records a shop visit and awards the configured points.
    pub async fn check_in(&self, id: &str) -> Result<Customer, ApiError> {
        let customer = self.store.check_in(id, self.config.checkin_points).await?;
        info!(id = %id, points = customer.points, "Customer checked in");
        Ok(customer)
    }

    pub async fn add_note(
        &self,
        id: &str,
        content: &str,
        created_by: Option<&str>,
    ) -> Result<CustomerNote, ApiError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::Required {
                field: "note".to_string(),
            }
            .into());
        }
        validate_optional_text("note", Some(content), MAX_NOTE_LEN)?;
        Ok(self.store.add_note(id, content, created_by).await?)
    }

    /// Sends `text` to the customer's number for `channel`.
    pub async fn send_message(&self, id: &str, channel: MessageChannel, text: &str) -> Result<(), ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::validation("message is required"));
        }
        let customer = self.get(id).await?;
        let to = customer.contact_for(channel)?;
        self.messenger.send(channel, to, text).await?;
        info!(id = %id, %channel, "Message sent");
        Ok(())
    }

    pub async fn stats(&self) -> Result<CustomerStats, ApiError> {
        let all = self.store.list_customers().await?;
        Ok(CustomerStats::from_customers(&all))
    }
}
