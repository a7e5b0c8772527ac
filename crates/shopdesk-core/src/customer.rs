//! # Customers
//!
//! Customer records, the loyalty ladder, and the filter/sort view behind the
//! customer list.
//!
//! ## Loyalty Ladder
//! ```text
//! ┌────────────┬───────────────┬──────────────────┐
//! │ Level      │ Points        │ Member discount  │
//! ├────────────┼───────────────┼──────────────────┤
//! │ Bronze     │ 0 – 999       │ 0%               │
//! │ Silver     │ 1000 – 1999   │ 2%               │
//! │ Gold       │ 2000 – 4999   │ 3%               │
//! │ Platinum   │ 5000+         │ 5%               │
//! └────────────┴───────────────┴──────────────────┘
//! ```
//! Levels only go up: spending points never demotes a customer.
//!
//! ## List View
//! Every active predicate must hold (logical AND). Empty tag sets and unset
//! flags do not constrain. Without a sort key the input order is kept.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::filter::{contains_ignore_case, SearchQuery, Searchable};
use crate::money::Money;
use crate::types::{CustomerType, PaymentMethod};
use crate::validation::{
    validate_email, validate_name, validate_optional_text, validate_phone, ValidationResult,
};

/// Points awarded for a shop visit when the config does not say otherwise.
pub const DEFAULT_CHECK_IN_POINTS: i64 = 5;

/// Days without a visit after which a customer counts as lapsed.
pub const DEFAULT_INACTIVE_DAYS: u32 = 90;

// =============================================================================
// Loyalty
// =============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum LoyaltyLevel {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyLevel {
    pub const ALL: [LoyaltyLevel; 4] = [
        LoyaltyLevel::Bronze,
        LoyaltyLevel::Silver,
        LoyaltyLevel::Gold,
        LoyaltyLevel::Platinum,
    ];

    /// Level earned by a points balance.
    pub fn for_points(points: i64) -> Self {
        LoyaltyLevel::ALL
            .into_iter()
            .rev()
            .find(|level| points >= level.min_points())
            .unwrap_or_default()
    }

    pub const fn min_points(&self) -> i64 {
        match self {
            LoyaltyLevel::Bronze => 0,
            LoyaltyLevel::Silver => 1000,
            LoyaltyLevel::Gold => 2000,
            LoyaltyLevel::Platinum => 5000,
        }
    }

    /// Member discount in basis points.
    pub const fn discount_bps(&self) -> u32 {
        match self {
            LoyaltyLevel::Bronze => 0,
            LoyaltyLevel::Silver => 200,
            LoyaltyLevel::Gold => 300,
            LoyaltyLevel::Platinum => 500,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            LoyaltyLevel::Bronze => "bronze",
            LoyaltyLevel::Silver => "silver",
            LoyaltyLevel::Gold => "gold",
            LoyaltyLevel::Platinum => "platinum",
        }
    }
}

impl fmt::Display for LoyaltyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LoyaltyLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoyaltyLevel::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "loyalty_level".to_string(),
                allowed: LoyaltyLevel::ALL.iter().map(|l| l.to_string()).collect(),
            })
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A payment recorded against a customer account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerPayment {
    pub id: String,
    pub order_id: Option<String>,
    pub amount: Money,
    pub method: PaymentMethod,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

/// A free-text note on a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerNote {
    pub id: String,
    pub content: String,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub city: Option<String>,
    pub customer_type: CustomerType,
    pub loyalty_level: Option<LoyaltyLevel>,
    /// Free-form label ("vip", "complainer", "new").
    pub color_tag: Option<String>,
    /// How the customer heard about the shop.
    pub referral_source: Option<String>,
    pub points: i64,
    /// Denormalised lifetime spend; falls back to Σ payments when absent.
    pub total_spent: Option<Money>,
    pub payments: Vec<CustomerPayment>,
    pub notes: Vec<CustomerNote>,
    pub birth_month: Option<u32>,
    pub birth_day: Option<u32>,
    pub is_active: bool,
    /// Cleared when staff open a customer created from the website.
    pub is_read: bool,
    #[ts(as = "String")]
    pub joined_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub last_visit_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// Lifetime spend.
    pub fn spent(&self) -> Money {
        self.total_spent
            .unwrap_or_else(|| self.payments.iter().map(|p| p.amount).sum())
    }

    /// Stored level, or the level the points balance earns.
    pub fn effective_level(&self) -> LoyaltyLevel {
        self.loyalty_level
            .unwrap_or_else(|| LoyaltyLevel::for_points(self.points))
    }

    pub fn has_birthday(&self) -> bool {
        self.birth_month.is_some() || self.birth_day.is_some()
    }

    pub fn has_whatsapp(&self) -> bool {
        self.whatsapp
            .as_deref()
            .is_some_and(|w| !w.trim().is_empty())
    }

    /// Adds points and upgrades the level if the new balance earns it.
    pub fn award_points(&mut self, points: i64) {
        self.points += points;
        let earned = LoyaltyLevel::for_points(self.points);
        let current = self.loyalty_level.unwrap_or_default();
        self.loyalty_level = Some(current.max(earned));
    }

    /// Records a visit to the shop.
    pub fn check_in(&mut self, points: i64, now: DateTime<Utc>) {
        self.award_points(points);
        self.last_visit_at = Some(now);
    }

    /// Number to reach the customer on `channel`.
    pub fn contact_for(&self, channel: MessageChannel) -> CoreResult<&str> {
        let number = match channel {
            MessageChannel::Sms => Some(self.phone.as_str()),
            MessageChannel::WhatsApp => self.whatsapp.as_deref(),
        };
        number
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CoreError::NoContactChannel {
                channel: channel.to_string(),
            })
    }
}

impl Searchable for Customer {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.name),
            Some(&self.phone),
            self.email.as_deref(),
            self.city.as_deref(),
        ]
    }
}

/// Outbound messaging channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum MessageChannel {
    Sms,
    WhatsApp,
}

impl fmt::Display for MessageChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageChannel::Sms => f.write_str("SMS"),
            MessageChannel::WhatsApp => f.write_str("WhatsApp"),
        }
    }
}

// =============================================================================
// Filter & Sort
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CustomerStatus {
    Active,
    Inactive,
}

impl CustomerStatus {
    fn matches(&self, customer: &Customer) -> bool {
        match self {
            CustomerStatus::Active => customer.is_active,
            CustomerStatus::Inactive => !customer.is_active,
        }
    }
}

/// Filter state of the customer list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerFilter {
    /// Matched against name, phone, email and city.
    pub search: String,
    pub loyalty_levels: Vec<LoyaltyLevel>,
    pub statuses: Vec<CustomerStatus>,
    pub color_tags: Vec<String>,
    pub referral_sources: Vec<String>,
    /// Only customers with a birthday on file.
    pub has_birthday: bool,
    /// Only customers with a WhatsApp number.
    pub has_whatsapp: bool,
    /// Only customers whose last visit is more than this many days ago.
    /// Customers who never visited are excluded.
    pub inactive_for_days: Option<u32>,
}

impl CustomerFilter {
    /// True if `customer` passes every predicate.
    pub fn matches(&self, query: &SearchQuery, customer: &Customer, now: DateTime<Utc>) -> bool {
        query.matches(customer)
            && (self.loyalty_levels.is_empty()
                || self.loyalty_levels.contains(&customer.effective_level()))
            && (self.statuses.is_empty() || self.statuses.iter().any(|s| s.matches(customer)))
            && tag_matches(&self.color_tags, customer.color_tag.as_deref())
            && tag_matches(&self.referral_sources, customer.referral_source.as_deref())
            && (!self.has_birthday || customer.has_birthday())
            && (!self.has_whatsapp || customer.has_whatsapp())
            && self.inactive_for_days.map_or(true, |days| {
                customer
                    .last_visit_at
                    .is_some_and(|at| at < now - Duration::days(i64::from(days)))
            })
    }
}

fn tag_matches(wanted: &[String], tag: Option<&str>) -> bool {
    wanted.is_empty() || tag.is_some_and(|t| contains_ignore_case(wanted, t))
}

/// Sort key of the customer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CustomerSort {
    /// A → Z, ignoring case.
    Name,
    /// Newest customers first.
    Recent,
    /// Biggest spenders first.
    Spent,
    /// Most points first.
    Points,
}

impl CustomerSort {
    pub fn compare(&self, a: &Customer, b: &Customer) -> Ordering {
        match self {
            CustomerSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            CustomerSort::Recent => Reverse(a.joined_at).cmp(&Reverse(b.joined_at)),
            CustomerSort::Spent => Reverse(a.spent()).cmp(&Reverse(b.spent())),
            CustomerSort::Points => Reverse(a.points).cmp(&Reverse(b.points)),
        }
    }
}

/// Filters and optionally sorts the customer list. The sort is stable.
pub fn filter_customers(
    customers: &[Customer],
    filter: &CustomerFilter,
    sort: Option<CustomerSort>,
    now: DateTime<Utc>,
) -> Vec<Customer> {
    let query = SearchQuery::new(&filter.search);
    let mut view: Vec<Customer> = customers
        .iter()
        .filter(|c| filter.matches(&query, c, now))
        .cloned()
        .collect();
    if let Some(sort) = sort {
        view.sort_by(|a, b| sort.compare(a, b));
    }
    view
}

// =============================================================================
// Stats
// =============================================================================

/// Header figures of the customers page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerStats {
    pub total: usize,
    pub active: usize,
    pub unread: usize,
    pub bronze: usize,
    pub silver: usize,
    pub gold: usize,
    pub platinum: usize,
    pub total_revenue: Money,
}

impl CustomerStats {
    pub fn from_customers(customers: &[Customer]) -> Self {
        let mut stats = CustomerStats {
            total: customers.len(),
            ..Default::default()
        };
        for c in customers {
            if c.is_active {
                stats.active += 1;
            }
            if !c.is_read {
                stats.unread += 1;
            }
            match c.effective_level() {
                LoyaltyLevel::Bronze => stats.bronze += 1,
                LoyaltyLevel::Silver => stats.silver += 1,
                LoyaltyLevel::Gold => stats.gold += 1,
                LoyaltyLevel::Platinum => stats.platinum += 1,
            }
            stats.total_revenue += c.spent();
        }
        stats
    }
}

// =============================================================================
// Create / Update Payload
// =============================================================================

/// Form data for creating or editing a customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInput {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub city: Option<String>,
    pub customer_type: CustomerType,
    pub color_tag: Option<String>,
    pub referral_source: Option<String>,
    pub birth_month: Option<u32>,
    pub birth_day: Option<u32>,
}

impl CustomerInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_phone(&self.phone)?;
        validate_email(self.email.as_deref())?;
        if let Some(whatsapp) = self.whatsapp.as_deref().filter(|w| !w.trim().is_empty()) {
            validate_phone(whatsapp)?;
        }
        validate_optional_text("city", self.city.as_deref(), 100)?;
        if let Some(month) = self.birth_month {
            check_range("birth_month", month, 1, 12)?;
        }
        if let Some(day) = self.birth_day {
            check_range("birth_day", day, 1, 31)?;
        }
        Ok(())
    }
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: i64::from(min),
            max: i64::from(max),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
