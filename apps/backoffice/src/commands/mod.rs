//! # Commands
//!
//! One module per top-level subcommand. Each exposes a clap `*Action` enum
//! and `run(ctx, action)`, which returns the JSON value `main` prints.
//!
//! ```text
//! main.rs ── Commands::Sale { action } ──► sale::run(&ctx, action)
//!                                              │
//!                                              ├── ctx.db.store().register_sale(..)
//!                                              └── json!(registered)
//! ```

pub mod client;
pub mod payment;
pub mod product;
pub mod report;
pub mod sale;
pub mod stock;
pub mod supplier;
pub mod user;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use siconi_core::{CoreError, DateRange, Product, Sale};
use siconi_db::{migrations, Database};

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// What every command gets to work with.
pub struct Context {
    pub db: Database,
    pub config: AppConfig,
}

impl Context {
    pub fn new(db: Database, config: AppConfig) -> Self {
        Context { db, config }
    }
}

/// `siconi init`: the database is already migrated by the time we get here.
pub async fn init(ctx: &Context) -> CliResult<Value> {
    let (embedded, applied) = migrations::migration_status(ctx.db.pool()).await?;
    let tables = migrations::table_names(ctx.db.pool()).await?;

    Ok(json!({
        "database": ctx.config.database_path,
        "store": ctx.config.store_name,
        "migrations": { "embedded": embedded, "applied": applied },
        "tables": tables,
    }))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> CliResult<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Looks a product up by code first, then by id.
pub(crate) async fn resolve_product(ctx: &Context, key: &str) -> CliResult<Product> {
    if let Some(product) = ctx.db.products().get_by_code(key).await? {
        return Ok(product);
    }
    ctx.db
        .products()
        .get_by_id(key)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(key.to_string()).into())
}

/// Looks a sale up by order code (`PED-0001`) first, then by id.
pub(crate) async fn resolve_sale(ctx: &Context, key: &str) -> CliResult<Sale> {
    if let Some(sale) = ctx.db.sales().get_by_code(key).await? {
        return Ok(sale);
    }
    ctx.db
        .sales()
        .get_by_id(key)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(key.to_string()).into())
}

/// `--from` / `--to` with today as the default for both ends.
pub(crate) fn date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> CliResult<DateRange> {
    let today = Utc::now().date_naive();
    let to = to.unwrap_or(today);
    let from = from.unwrap_or(to);
    DateRange::new(from, to).map_err(CliError::from)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use siconi_db::DbConfig;
    use std::path::PathBuf;

    pub async fn context() -> Context {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = AppConfig {
            database_path: PathBuf::from(":memory:"),
            store_name: "Taller de Prueba".to_string(),
            reports_dir: std::env::temp_dir().join(format!("siconi-reports-{}", siconi_core::new_id())),
            exchange_rate: None,
            currency_symbol: "$".to_string(),
        };
        Context::new(db, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_reports_tables() {
        let ctx = testing::context().await;
        let value = init(&ctx).await.unwrap();

        assert_eq!(value["migrations"]["embedded"], value["migrations"]["applied"]);
        let tables: Vec<String> = serde_json::from_value(value["tables"].clone()).unwrap();
        assert!(tables.iter().any(|t| t == "sales"));
    }

    #[tokio::test]
    async fn test_resolve_product_by_lowercase_code_or_id() {
        let ctx = testing::context().await;
        let product = ctx
            .db
            .products()
            .insert(&siconi_core::NewProduct {
                code: "trj-001".to_string(),
                name: "Traje de baño clásico".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(resolve_product(&ctx, "trj-001").await.unwrap().id, product.id);
        assert_eq!(resolve_product(&ctx, &product.id).await.unwrap().id, product.id);
        assert!(resolve_product(&ctx, "trj-404").await.is_err());
    }

    #[test]
    fn test_date_range_defaults_and_order() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let range = date_range(None, Some(day)).unwrap();
        assert_eq!(range.from, day);
        assert_eq!(range.to, day);

        let later = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        assert!(date_range(Some(later), Some(day)).is_err());
    }
}
