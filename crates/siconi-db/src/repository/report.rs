//! # Report Repository
//!
//! Read-only aggregates over sales, payments and stock. Nothing here writes.
//!
//! ## Figures
//! ```text
//! revenue  = Σ sale_details.subtotal_cents            (sales created in range)
//! cost     = Σ sale_details.quantity × products.cost_price_cents
//! profit   = revenue − cost
//! ```
//!
//! Cost uses the product's current cost price; the catalog keeps no cost
//! history.
//!
//! The `*_or_default` variants are for screens and printed reports that
//! should still render when a query fails: they log the error and return an
//! empty result.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, error};

use crate::error::DbResult;
use crate::repository::product::ProductRepository;
use siconi_core::ledger::PAID_TOLERANCE;
use siconi_core::{DateRange, MethodTotal, Product, Receivable, SalesSummary, TopProduct};

/// Everything printed on a period report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    pub range: DateRange,
    pub summary: SalesSummary,
    pub top_products: Vec<TopProduct>,
    pub payments_by_method: Vec<MethodTotal>,
    /// Σ balance due over all open sales, regardless of range.
    pub outstanding_cents: i64,
}

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Revenue, cost and profit of the sales created in `range`.
    pub async fn summary(&self, range: &DateRange) -> DbResult<SalesSummary> {
        debug!(from = %range.from, to = %range.to, "Computing sales summary");

        let (sale_count, units_sold, revenue_cents, cost_cents): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(DISTINCT s.id),
                    COALESCE(SUM(d.quantity), 0),
                    COALESCE(SUM(d.subtotal_cents), 0),
                    COALESCE(SUM(d.quantity * p.cost_price_cents), 0)
                FROM sales s
                JOIN sale_details d ON d.sale_id = s.id
                JOIN products p ON p.id = d.product_id
                WHERE s.created_at >= ?1 AND s.created_at < ?2
                "#,
            )
            .bind(range.start())
            .bind(range.end_exclusive())
            .fetch_one(&self.pool)
            .await?;

        Ok(SalesSummary {
            sale_count,
            units_sold,
            revenue_cents,
            cost_cents,
            profit_cents: revenue_cents - cost_cents,
        })
    }

    /// Best sellers by units, ties broken by revenue.
    pub async fn top_products(&self, range: &DateRange, limit: u32) -> DbResult<Vec<TopProduct>> {
        let products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                p.id AS product_id,
                p.code AS code,
                p.name AS name,
                SUM(d.quantity) AS units_sold,
                SUM(d.subtotal_cents) AS revenue_cents
            FROM sale_details d
            JOIN sales s ON s.id = d.sale_id
            JOIN products p ON p.id = d.product_id
            WHERE s.created_at >= ?1 AND s.created_at < ?2
            GROUP BY p.id, p.code, p.name
            ORDER BY units_sold DESC, revenue_cents DESC, p.code
            LIMIT ?3
            "#,
        )
        .bind(range.start())
        .bind(range.end_exclusive())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Active products at or below their minimum stock.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        ProductRepository::find_low_stock(&self.pool).await
    }

    /// Sales that still owe more than the paid tolerance, oldest first.
    pub async fn receivables(&self) -> DbResult<Vec<Receivable>> {
        let receivables = sqlx::query_as::<_, Receivable>(
            r#"
            SELECT
                s.id AS sale_id,
                s.code AS code,
                c.name AS client_name,
                s.total_cents AS total_cents,
                s.balance_due_cents AS balance_due_cents,
                s.status AS status,
                s.created_at AS created_at
            FROM sales s
            LEFT JOIN clients c ON c.id = s.client_id
            WHERE s.balance_due_cents > ?1
            ORDER BY s.created_at, s.rowid
            "#,
        )
        .bind(PAID_TOLERANCE.cents())
        .fetch_all(&self.pool)
        .await?;

        Ok(receivables)
    }

    /// Money received per payment method in `range`, largest first.
    pub async fn payments_by_method(&self, range: &DateRange) -> DbResult<Vec<MethodTotal>> {
        let totals = sqlx::query_as::<_, MethodTotal>(
            r#"
            SELECT
                method,
                COUNT(*) AS payment_count,
                SUM(amount_cents) AS amount_cents
            FROM payments
            WHERE paid_at >= ?1 AND paid_at < ?2
            GROUP BY method
            ORDER BY amount_cents DESC, method
            "#,
        )
        .bind(range.start())
        .bind(range.end_exclusive())
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }

    // -------------------------------------------------------------------------
    // Non-fatal variants
    // -------------------------------------------------------------------------

    pub async fn summary_or_default(&self, range: &DateRange) -> SalesSummary {
        self.summary(range).await.unwrap_or_else(|e| {
            error!(error = %e, "Sales summary failed");
            SalesSummary::default()
        })
    }

    pub async fn top_products_or_default(&self, range: &DateRange, limit: u32) -> Vec<TopProduct> {
        self.top_products(range, limit).await.unwrap_or_else(|e| {
            error!(error = %e, "Top products report failed");
            Vec::new()
        })
    }

    pub async fn low_stock_or_default(&self) -> Vec<Product> {
        self.low_stock().await.unwrap_or_else(|e| {
            error!(error = %e, "Low stock report failed");
            Vec::new()
        })
    }

    pub async fn receivables_or_default(&self) -> Vec<Receivable> {
        self.receivables().await.unwrap_or_else(|e| {
            error!(error = %e, "Receivables report failed");
            Vec::new()
        })
    }

    pub async fn payments_by_method_or_default(&self, range: &DateRange) -> Vec<MethodTotal> {
        self.payments_by_method(range).await.unwrap_or_else(|e| {
            error!(error = %e, "Payments by method report failed");
            Vec::new()
        })
    }

    /// The period report. Never fails; sections that could not be computed
    /// come back empty.
    pub async fn period_report(&self, range: &DateRange, top: u32) -> SalesReport {
        let outstanding_cents = self
            .receivables_or_default()
            .await
            .iter()
            .map(|r| r.balance_due_cents)
            .sum();

        SalesReport {
            range: *range,
            summary: self.summary_or_default(range).await,
            top_products: self.top_products_or_default(range, top).await,
            payments_by_method: self.payments_by_method_or_default(range).await,
            outstanding_cents,
        }
    }
}
