//! # Catalog Administration
//!
//! Brands, categories and suppliers: the reference data behind the product
//! list. All three share the soft-delete lifecycle from [`crate::record`] and
//! the same list view.
//!
//! ## List View
//! ```text
//! records ──► show_deleted? ──► in category? ──► search matches? ──► view
//!                                                                      │
//!                               brands only: popularity order ◄────────┘
//! ```
//!
//! Brand ordering puts well-known brands first (in [`BRAND_POPULARITY`]
//! order) and the rest alphabetically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use ts_rs::TS;

use crate::filter::{contains_ignore_case, SearchQuery, Searchable};
use crate::record::{RecordStatus, SoftDelete};
use crate::validation::{
    validate_email, validate_name, validate_optional_text, validate_phone, ValidationResult,
};

/// Brands shown first in brand lists, most recognised first.
pub const BRAND_POPULARITY: &[&str] = &[
    "Apple", "Samsung", "Google", "Microsoft", "Lenovo", "HP", "Dell", "Huawei", "Xiaomi",
    "OnePlus", "Sony", "LG", "Motorola", "Nokia", "Tecno", "Infinix", "Itel", "HTC", "Asus",
    "Acer", "Canon", "Epson", "Brother",
];

/// Position of `name` in [`BRAND_POPULARITY`], ignoring case.
pub fn popularity_rank(name: &str) -> Option<usize> {
    let name = name.trim();
    BRAND_POPULARITY
        .iter()
        .position(|b| b.eq_ignore_ascii_case(name))
}

/// Popular brands by rank, then everything else by case-insensitive name.
pub fn compare_brand_popularity(a: &str, b: &str) -> Ordering {
    match (popularity_rank(a), popularity_rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

// =============================================================================
// Catalog Kind
// =============================================================================

/// Which catalog table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CatalogKind {
    Brand,
    Category,
    Supplier,
}

impl CatalogKind {
    pub const fn entity(&self) -> &'static str {
        match self {
            CatalogKind::Brand => Brand::ENTITY,
            CatalogKind::Category => Category::ENTITY,
            CatalogKind::Supplier => Supplier::ENTITY,
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity())
    }
}

// =============================================================================
// Records
// =============================================================================

/// Common view of a catalog record for filtering.
pub trait CatalogRecord: SoftDelete + Searchable {
    fn name(&self) -> &str;

    /// True if the record belongs to `category` (name or id).
    fn in_category(&self, category: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    /// Category tags ("Phones", "Laptops").
    pub categories: Vec<String>,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Badge colour in the UI, e.g. `#3b82f6`.
    pub color: Option<String>,
    pub parent_id: Option<String>,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    /// Categories the supplier stocks.
    pub categories: Vec<String>,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

macro_rules! soft_delete_via_status {
    ($ty:ty, $entity:literal) => {
        impl SoftDelete for $ty {
            const ENTITY: &'static str = $entity;

            fn id(&self) -> &str {
                &self.id
            }

            fn status(&self) -> RecordStatus {
                self.status
            }

            fn set_status(&mut self, status: RecordStatus) {
                self.status = status;
            }
        }
    };
}

soft_delete_via_status!(Brand, "Brand");
soft_delete_via_status!(Category, "Category");
soft_delete_via_status!(Supplier, "Supplier");

impl Searchable for Brand {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(&self.name), self.description.as_deref()]
    }
}

impl CatalogRecord for Brand {
    fn name(&self) -> &str {
        &self.name
    }

    fn in_category(&self, category: &str) -> bool {
        contains_ignore_case(&self.categories, category)
    }
}

impl Searchable for Category {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(&self.name), self.description.as_deref()]
    }
}

impl CatalogRecord for Category {
    fn name(&self) -> &str {
        &self.name
    }

    /// A category is "in" itself and in its parent.
    fn in_category(&self, category: &str) -> bool {
        let category = category.trim();
        self.id == category
            || self.name.eq_ignore_ascii_case(category)
            || self.parent_id.as_deref() == Some(category)
    }
}

impl Searchable for Supplier {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.name),
            self.contact_person.as_deref(),
            self.phone.as_deref(),
            self.email.as_deref(),
            self.city.as_deref(),
        ]
    }
}

impl CatalogRecord for Supplier {
    fn name(&self) -> &str {
        &self.name
    }

    fn in_category(&self, category: &str) -> bool {
        contains_ignore_case(&self.categories, category)
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Filter state of a catalog list page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogFilter {
    pub search: String,
    /// Category tag; `None` or "all" means any.
    pub category: Option<String>,
    /// Include soft-deleted records.
    pub show_deleted: bool,
}

impl CatalogFilter {
    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
    }

    /// True if `record` passes every predicate.
    pub fn matches<T: CatalogRecord>(&self, query: &SearchQuery, record: &T) -> bool {
        (self.show_deleted || record.is_active())
            && self.category().map_or(true, |c| record.in_category(c))
            && query.matches(record)
    }
}

/// Applies `filter` and keeps the input order.
pub fn filter_records<T: CatalogRecord + Clone>(records: &[T], filter: &CatalogFilter) -> Vec<T> {
    let query = SearchQuery::new(&filter.search);
    records
        .iter()
        .filter(|r| filter.matches(&query, *r))
        .cloned()
        .collect()
}

/// Applies `filter` and orders by brand popularity.
pub fn filter_brands(brands: &[Brand], filter: &CatalogFilter) -> Vec<Brand> {
    let mut view = filter_records(brands, filter);
    view.sort_by(|a, b| compare_brand_popularity(&a.name, &b.name));
    view
}

// =============================================================================
// Create / Update Payloads
// =============================================================================

/// Form data for creating or editing a brand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BrandInput {
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub categories: Vec<String>,
}

impl BrandInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_optional_text("description", self.description.as_deref(), 1000)?;
        validate_optional_text("website", self.website.as_deref(), 200)?;
        Ok(())
    }

    /// Trimmed, de-duplicated category tags.
    pub fn normalized_categories(&self) -> Vec<String> {
        normalize_tags(&self.categories)
    }
}

/// Form data for creating or editing a category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<String>,
}

impl CategoryInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_optional_text("description", self.description.as_deref(), 1000)?;
        validate_optional_text("color", self.color.as_deref(), 20)?;
        Ok(())
    }
}

/// Form data for creating or editing a supplier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SupplierInput {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub categories: Vec<String>,
}

impl SupplierInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            validate_phone(phone)?;
        }
        validate_email(self.email.as_deref())?;
        validate_optional_text("address", self.address.as_deref(), 500)?;
        Ok(())
    }

    pub fn normalized_categories(&self) -> Vec<String> {
        normalize_tags(&self.categories)
    }
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !contains_ignore_case(&out, tag) {
            out.push(tag.to_string());
        }
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
