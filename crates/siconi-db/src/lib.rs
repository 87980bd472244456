//! # siconi-db: Database Layer for SICONI
//!
//! Database access for the workshop's point of sale. One SQLite file, opened
//! through an sqlx pool; every table has a repository and every write that
//! spans tables goes through [`StoreService`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SICONI Data Flow                                 │
//! │                                                                         │
//! │  `siconi sale register ...`                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     siconi-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │ StoreService  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ (service.rs)  │    │  (embedded)  │  │   │
//! │  │   │               │    │ one tx per op │    │ 001_schema   │  │   │
//! │  │   │ SqlitePool    │    ├───────────────┤    │ 002_seed     │  │   │
//! │  │   │               │◄───│ Repositories  │    │ + additive   │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (SICONI_DB_PATH)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded migrations plus additive column upgrades
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table, plus reports
//! - [`service`] - Transactional sale, payment, stock and code operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use siconi_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("siconi.db")).await?;
//! let sale = db.store().register_sale(&new_sale).await?;
//! db.close().await;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::{PaymentReceipt, RegisteredSale, StockAdjustment, StoreService};

pub use repository::category::CategoryRepository;
pub use repository::client::ClientRepository;
pub use repository::club::ClubRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::{SaleFilter, SaleRepository};
pub use repository::supplier::SupplierRepository;
pub use repository::user::UserRepository;
