//! # Repository Module
//!
//! Database repository implementations for SICONI.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLI command                                                           │
//! │       │  db.products().search("gorro", 20)                             │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── search / get_by_id / get_by_code      (pool)                      │
//! │  ├── insert / update / deactivate          (pool)                      │
//! │  └── find_by_id / adjust_stock_guarded     (any executor, used by      │
//! │                                             StoreService inside a tx)  │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Methods taking `&self` run against the pool. Associated functions that
//! take an `Executor` are the building blocks [`crate::service::StoreService`]
//! strings together inside one transaction.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD, search, guarded stock updates
//! - [`category::CategoryRepository`] / [`club::ClubRepository`] - Seeded lookups
//! - [`supplier::SupplierRepository`] / [`client::ClientRepository`]
//! - [`sale::SaleRepository`] - Headers, details, delivery, invoice numbers
//! - [`payment::PaymentRepository`] - Append-only payments
//! - [`inventory::InventoryRepository`] - Append-only stock audit trail
//! - [`user::UserRepository`] - Accounts with Argon2 hashes
//! - [`report::ReportRepository`] - Read-only aggregates
//! - [`counter`] - Sequential code counters

pub mod category;
pub mod client;
pub mod club;
pub mod counter;
pub mod inventory;
pub mod payment;
pub mod product;
pub mod report;
pub mod sale;
pub mod supplier;
pub mod user;

/// Trims an optional text field, mapping blank to `None`.
pub(crate) fn clean_opt(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `%term%` for LIKE searches, with LIKE wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
