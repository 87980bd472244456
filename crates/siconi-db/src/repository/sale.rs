//! # Sale Repository
//!
//! Reads and single-row writes for sales and their lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. REGISTER (StoreService::register_sale, one transaction)            │
//! │     └── header + details + stock decrement + movements + deposit       │
//! │         → PENDIENTE / ABONADO / PAGADO                                 │
//! │                                                                         │
//! │  2. PAY (StoreService::register_payment, one transaction)              │
//! │     └── payment row + apply_payment_amount() + status upgrade          │
//! │                                                                         │
//! │  3. INVOICE (StoreService::issue_invoice)                              │
//! │     └── invoice_number + control_number, once                          │
//! │                                                                         │
//! │  4. DELIVER (mark_delivered)                                           │
//! │     └── ENTREGADO + delivered_at                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Details are written once with the header and never updated.

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use siconi_core::{CoreError, DateRange, Sale, SaleDetail, SaleStatus};

const SALE_COLUMNS: &str = r#"
    id, code, client_id, total_cents, amount_paid_cents, balance_due_cents,
    exchange_rate, status, invoice_number, control_number, notes,
    created_at, updated_at, delivered_at
"#;

/// Filters for [`SaleRepository::list`]. Unset fields do not filter.
#[derive(Debug, Clone)]
pub struct SaleFilter {
    pub range: Option<DateRange>,
    pub status: Option<SaleStatus>,
    pub client_id: Option<String>,
    pub limit: u32,
}

impl Default for SaleFilter {
    fn default() -> Self {
        SaleFilter {
            range: None,
            status: None,
            client_id: None,
            limit: 100,
        }
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        Self::find_by_id(&self.pool, id).await
    }

    /// Gets a sale by its order code (`PED-0001`).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales WHERE code = ?1",
            SALE_COLUMNS
        ))
        .bind(code.trim().to_uppercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Sales matching `filter`, newest first.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        debug!(?filter, "Listing sales");

        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {} FROM sales
            WHERE (?1 IS NULL OR created_at >= ?1)
              AND (?2 IS NULL OR created_at < ?2)
              AND (?3 IS NULL OR status = ?3)
              AND (?4 IS NULL OR client_id = ?4)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?5
            "#,
            SALE_COLUMNS
        ))
        .bind(filter.range.map(|r| r.start()))
        .bind(filter.range.map(|r| r.end_exclusive()))
        .bind(filter.status)
        .bind(&filter.client_id)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Line items of a sale, in the order they were entered.
    pub async fn details(&self, sale_id: &str) -> DbResult<Vec<SaleDetail>> {
        let details = sqlx::query_as::<_, SaleDetail>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price_cents, subtotal_cents
            FROM sale_details
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// Hands the order over: ENTREGADO from any earlier status.
    ///
    /// Delivery does not settle money; an order delivered with a balance
    /// still shows up in receivables.
    pub async fn mark_delivered(&self, id: &str) -> DbResult<Sale> {
        let now = Utc::now();

        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            UPDATE sales SET
                status = ?2,
                delivered_at = ?3,
                updated_at = ?3
            WHERE id = ?1 AND status != ?2
            RETURNING {}
            "#,
            SALE_COLUMNS
        ))
        .bind(id)
        .bind(SaleStatus::Entregado)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match sale {
            Some(sale) => {
                info!(id = %id, code = %sale.code, "Sale delivered");
                Ok(sale)
            }
            None => match self.get_by_id(id).await? {
                Some(existing) => Err(CoreError::InvalidSaleStatus {
                    sale_id: existing.code,
                    current_status: existing.status.to_string(),
                }
                .into()),
                None => Err(CoreError::SaleNotFound(id.to_string()).into()),
            },
        }
    }

    // -------------------------------------------------------------------------
    // Executor-generic building blocks (used inside StoreService transactions)
    // -------------------------------------------------------------------------

    pub async fn find_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Sale>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales WHERE id = ?1",
            SALE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(sale)
    }

    pub(crate) async fn insert_header<'e, E>(executor: E, sale: &Sale) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %sale.id, code = %sale.code, "Inserting sale header");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, code, client_id, total_cents, amount_paid_cents, balance_due_cents,
                exchange_rate, status, invoice_number, control_number, notes,
                created_at, updated_at, delivered_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.code)
        .bind(&sale.client_id)
        .bind(sale.total_cents)
        .bind(sale.amount_paid_cents)
        .bind(sale.balance_due_cents)
        .bind(sale.exchange_rate)
        .bind(sale.status)
        .bind(&sale.invoice_number)
        .bind(&sale.control_number)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .bind(sale.delivered_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub(crate) async fn insert_detail<'e, E>(executor: E, detail: &SaleDetail) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO sale_details (
                id, sale_id, product_id, quantity, unit_price_cents, subtotal_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&detail.id)
        .bind(&detail.sale_id)
        .bind(&detail.product_id)
        .bind(detail.quantity)
        .bind(detail.unit_price_cents)
        .bind(detail.subtotal_cents)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Adds `amount_cents` to what was paid and recomputes the balance from
    /// the stored total, in one statement. Returns the updated row.
    pub(crate) async fn apply_payment_amount<'e, E>(
        executor: E,
        id: &str,
        amount_cents: i64,
    ) -> DbResult<Sale>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            UPDATE sales SET
                amount_paid_cents = amount_paid_cents + ?2,
                balance_due_cents = total_cents - (amount_paid_cents + ?2),
                updated_at = ?3
            WHERE id = ?1
            RETURNING {}
            "#,
            SALE_COLUMNS
        ))
        .bind(id)
        .bind(amount_cents)
        .bind(Utc::now())
        .fetch_optional(executor)
        .await?;

        sale.ok_or_else(|| CoreError::SaleNotFound(id.to_string()).into())
    }

    pub(crate) async fn set_status<'e, E>(executor: E, id: &str, status: SaleStatus) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE sales SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }
        Ok(())
    }

    /// Stores invoice and control numbers on a sale that has none yet.
    /// Returns `false` if the sale already carries an invoice number.
    pub(crate) async fn assign_invoice<'e, E>(
        executor: E,
        id: &str,
        invoice_number: &str,
        control_number: &str,
    ) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE sales SET
                invoice_number = ?2,
                control_number = ?3,
                updated_at = ?4
            WHERE id = ?1 AND invoice_number IS NULL
            "#,
        )
        .bind(id)
        .bind(invoice_number)
        .bind(control_number)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, TimeZone};
    use siconi_core::{Money, NewClient, NewProduct, NewSale, Product, SaleLineInput};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn product(db: &Database, code: &str) -> Product {
        db.products()
            .insert(&NewProduct {
                code: code.to_string(),
                name: format!("Producto {}", code),
                sale_price: Money::from_cents(1000),
                initial_stock: 20,
                ..Default::default()
            })
            .await
            .unwrap()
    }

    async fn sale(db: &Database, client_id: Option<&str>, lines: &[&Product], paid: i64) -> Sale {
        db.store()
            .register_sale(&NewSale {
                client_id: client_id.map(str::to_string),
                lines: lines
                    .iter()
                    .map(|p| SaleLineInput {
                        product_id: p.id.clone(),
                        quantity: 1,
                        unit_price: None,
                    })
                    .collect(),
                amount_paid: Money::from_cents(paid),
                ..Default::default()
            })
            .await
            .unwrap()
            .sale
    }

    #[tokio::test]
    async fn test_details_keep_entry_order() {
        let db = setup().await;
        let bag = product(&db, "BOL-003").await;
        let suit = product(&db, "TRJ-001").await;
        let cap = product(&db, "GOR-002").await;

        let sale = sale(&db, None, &[&bag, &suit, &cap], 0).await;
        let details = db.sales().details(&sale.id).await.unwrap();

        let ids: Vec<&str> = details.iter().map(|d| d.product_id.as_str()).collect();
        assert_eq!(ids, [bag.id.as_str(), suit.id.as_str(), cap.id.as_str()]);
        assert!(details.iter().all(|d| d.subtotal_cents == 1000));
    }

    #[tokio::test]
    async fn test_assign_invoice_only_once() {
        let db = setup().await;
        let suit = product(&db, "TRJ-001").await;
        let sale = sale(&db, None, &[&suit], 0).await;

        let first = SaleRepository::assign_invoice(db.pool(), &sale.id, "00000001", "00-00000001")
            .await
            .unwrap();
        assert!(first);

        let second = SaleRepository::assign_invoice(db.pool(), &sale.id, "00000002", "00-00000002")
            .await
            .unwrap();
        assert!(!second);

        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.invoice_number.as_deref(), Some("00000001"));
        assert_eq!(stored.control_number.as_deref(), Some("00-00000001"));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = setup().await;
        let suit = product(&db, "TRJ-001").await;
        let client = db
            .clients()
            .insert(&NewClient {
                name: "Club Delfines".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let april = sale(&db, None, &[&suit], 0).await;
        let april_noon = NaiveDate::from_ymd_opt(2024, 4, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        sqlx::query("UPDATE sales SET created_at = ?1 WHERE id = ?2")
            .bind(Utc.from_utc_datetime(&april_noon))
            .bind(&april.id)
            .execute(db.pool())
            .await
            .unwrap();

        let owed = sale(&db, Some(&client.id), &[&suit], 0).await;
        let paid = sale(&db, None, &[&suit], 1000).await;

        let by_status = db
            .sales()
            .list(&SaleFilter {
                status: Some(SaleStatus::Pagado),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].id, paid.id);

        let by_client = db
            .sales()
            .list(&SaleFilter {
                client_id: Some(client.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_client.len(), 1);
        assert_eq!(by_client[0].id, owed.id);

        let since_may = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2100, 12, 31).unwrap(),
        )
        .unwrap();
        let in_range = db
            .sales()
            .list(&SaleFilter {
                range: Some(since_may),
                ..Default::default()
            })
            .await
            .unwrap();
        let ids: Vec<&str> = in_range.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, [paid.id.as_str(), owed.id.as_str()]);

        let newest = db
            .sales()
            .list(&SaleFilter {
                limit: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].id, paid.id);
    }

    #[tokio::test]
    async fn test_mark_delivered_once() {
        let db = setup().await;
        let suit = product(&db, "TRJ-001").await;
        let sale = sale(&db, None, &[&suit], 400).await;

        let delivered = db.sales().mark_delivered(&sale.id).await.unwrap();
        assert_eq!(delivered.status, SaleStatus::Entregado);
        assert!(delivered.delivered_at.is_some());
        assert_eq!(delivered.balance_due_cents, 600);

        let err = db.sales().mark_delivered(&sale.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidSaleStatus { .. })));

        let err = db.sales().mark_delivered("no-such-sale").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::SaleNotFound(_))));
    }
}
