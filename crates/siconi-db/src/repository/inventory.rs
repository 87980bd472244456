//! # Inventory Repository
//!
//! The stock audit trail. Rows are only ever inserted: there is no update
//! and no delete, so the trail can always be replayed to explain a product's
//! current stock.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use siconi_core::{DateRange, InventoryMovement};

const SELECT_MOVEMENT: &str = r#"
    SELECT id, product_id, quantity, kind, observation, sale_id, created_at
    FROM inventory_movements
"#;

#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Movements of one product, newest first.
    pub async fn history(&self, product_id: &str, limit: u32) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(&format!(
            "{} WHERE product_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            SELECT_MOVEMENT
        ))
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Movements written by one sale.
    pub async fn for_sale(&self, sale_id: &str) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(&format!(
            "{} WHERE sale_id = ?1 ORDER BY rowid",
            SELECT_MOVEMENT
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// All movements in a date range, oldest first.
    pub async fn list(&self, range: &DateRange) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(&format!(
            "{} WHERE created_at >= ?1 AND created_at < ?2 ORDER BY created_at, rowid",
            SELECT_MOVEMENT
        ))
        .bind(range.start())
        .bind(range.end_exclusive())
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Net stock change recorded for a product (Σ ENTRADA − Σ SALIDA).
    pub async fn net_change(&self, product_id: &str) -> DbResult<i64> {
        let net: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(CASE kind WHEN 'ENTRADA' THEN quantity ELSE -quantity END)
            FROM inventory_movements
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(net.unwrap_or(0))
    }

    /// Appends a movement.
    pub(crate) async fn insert<'e, E>(executor: E, movement: &InventoryMovement) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(
            product_id = %movement.product_id,
            kind = movement.kind.as_str(),
            quantity = movement.quantity,
            "Recording inventory movement"
        );

        sqlx::query(
            r#"
            INSERT INTO inventory_movements (
                id, product_id, quantity, kind, observation, sale_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.quantity)
        .bind(movement.kind)
        .bind(&movement.observation)
        .bind(&movement.sale_id)
        .bind(movement.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }
}
