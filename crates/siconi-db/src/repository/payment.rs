//! # Payment Repository
//!
//! Payments are append-only. The sale's `amount_paid_cents` always equals
//! the sum of its payment rows, including the deposit taken at registration.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use siconi_core::{DateRange, Payment};

const SELECT_PAYMENT: &str =
    "SELECT id, sale_id, paid_at, amount_cents, method, reference, notes FROM payments";

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!("{} WHERE id = ?1", SELECT_PAYMENT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    /// Payments of one sale, oldest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "{} WHERE sale_id = ?1 ORDER BY paid_at, rowid",
            SELECT_PAYMENT
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Every payment received in a date range.
    pub async fn list(&self, range: &DateRange) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "{} WHERE paid_at >= ?1 AND paid_at < ?2 ORDER BY paid_at, rowid",
            SELECT_PAYMENT
        ))
        .bind(range.start())
        .bind(range.end_exclusive())
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Σ amount of a sale's payments, in cents.
    pub async fn total_for_sale(&self, sale_id: &str) -> DbResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(amount_cents) FROM payments WHERE sale_id = ?1")
                .bind(sale_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(total.unwrap_or(0))
    }

    pub(crate) async fn insert<'e, E>(executor: E, payment: &Payment) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(
            sale_id = %payment.sale_id,
            amount = payment.amount_cents,
            method = payment.method.as_str(),
            "Recording payment"
        );

        sqlx::query(
            r#"
            INSERT INTO payments (id, sale_id, paid_at, amount_cents, method, reference, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.paid_at)
        .bind(payment.amount_cents)
        .bind(payment.method)
        .bind(&payment.reference)
        .bind(&payment.notes)
        .execute(executor)
        .await?;

        Ok(())
    }
}
