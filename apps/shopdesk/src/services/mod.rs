//! # Services
//!
//! One service per screen. Each validates input, calls its ports and maps
//! every failure to [`crate::error::ApiError`].
//!
//! | Service           | Screen                          | Ports                         |
//! |-------------------|---------------------------------|-------------------------------|
//! | `PosService`      | Till: search, cart, checkout    | `ProductStore`, `OrderGateway` |
//! | `CustomerService` | Customer list and drawer        | `CustomerStore`, `Messenger`  |
//! | `CatalogService`  | Brands, categories, suppliers   | `CatalogStore<E>`             |

mod catalog;
mod customers;
mod pos;

#[cfg(test)]
pub(crate) mod fakes;

pub use catalog::{CatalogPage, CatalogService};
pub use customers::CustomerService;
pub use pos::{CartValidation, CartView, PosService, ITEMS_REMOVED, SALE_FAILED};
