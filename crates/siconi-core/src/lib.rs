//! # siconi-core: Pure Business Logic for SICONI
//!
//! Everything the workshop's sales counter has to get right, expressed as
//! pure functions over plain data. No database, no clock, no file system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SICONI Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/backoffice (`siconi` CLI)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              siconi-db (repositories, StoreService)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ siconi-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐ ┌───────┐ │   │
//! │  │   │  types  │  │  money  │  │ ledger  │  │  codes  │ │ valid │ │   │
//! │  │   │ Product │  │  Money  │  │ balance │  │PED-0001 │ │ ation │ │   │
//! │  │   │  Sale   │  │         │  │ status  │  │         │ │       │ │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └─────────┘ └───────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Payment, InventoryMovement, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`ledger`] - Sale totals, balance due and status transitions
//! - [`codes`] - Human-readable sequential identifiers
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use siconi_core::ledger::{self, SaleLine};
//! use siconi_core::{Money, SaleStatus};
//!
//! let lines = [SaleLine::new(3, Money::from_cents(2000))];
//! let total = ledger::sale_total(&lines).unwrap();
//! let paid = Money::from_cents(3000);
//!
//! assert_eq!(total.cents(), 6000);
//! assert_eq!(ledger::balance_due(total, paid).cents(), 3000);
//! assert_eq!(ledger::initial_status(total, paid), SaleStatus::Abonado);
//! ```

pub mod codes;
pub mod error;
pub mod ledger;
pub mod money;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum quantity of a single product on one sale line.
///
/// Guards against typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum number of lines on a single order.
pub const MAX_SALE_LINES: usize = 100;

/// Largest price or payment accepted, in cents ($100,000,000.00).
///
/// With the line and quantity limits above, no sale total can get near
/// `i64::MAX`.
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000;

/// Generates a new entity id (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
