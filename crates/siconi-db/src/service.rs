//! # Store Service
//!
//! Every operation that writes to more than one table. Each public method
//! opens one transaction, runs the steps against that connection, and
//! either commits everything or rolls everything back.
//!
//! ## Sale Registration
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register_sale(NewSale)                                   BEGIN        │
//! │       │                                                                 │
//! │       ├── client exists?                    no → ClientNotFound        │
//! │       ├── load each product                 no → ProductNotFound       │
//! │       ├── ledger: totals, balance, status   bad → EmptySale / ...      │
//! │       ├── counters: order → PED-0001                                   │
//! │       ├── INSERT sales                                                 │
//! │       ├── INSERT sale_details (per line)                               │
//! │       ├── UPDATE products ... WHERE stock>=q   0 rows → InsufficientStock│
//! │       ├── INSERT inventory_movements SALIDA "VENTA PED-0001"           │
//! │       └── INSERT payments (deposit, if any)                            │
//! │                                                          COMMIT        │
//! │  any error ───────────────────────────────────────────► ROLLBACK       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter increment is part of the transaction, so a failed sale does
//! not burn an order number.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::repository::client::ClientRepository;
use crate::repository::counter;
use crate::repository::inventory::InventoryRepository;
use crate::repository::payment::PaymentRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::clean_opt;
use siconi_core::codes::CodeKind;
use siconi_core::ledger::{self, SaleLine, SaleTotals};
use siconi_core::validation::{
    normalize_reason, validate_exchange_rate, validate_price, validate_quantity,
    validate_stock_delta,
};
use siconi_core::{
    new_id, CoreError, InventoryMovement, Money, MovementKind, NewPayment, NewSale, Payment,
    Product, Sale, SaleDetail, MAX_SALE_LINES,
};

/// Exchange rate stored when the caller did not capture one.
pub const DEFAULT_EXCHANGE_RATE: f64 = 1.0;

/// A committed sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredSale {
    pub sale: Sale,
    pub details: Vec<SaleDetail>,
    /// Deposit in excess of the total, kept as customer credit.
    pub overpayment: Money,
}

/// A committed payment and the sale as it stands afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub sale: Sale,
    /// Part of the payment beyond the balance that was due. Zero normally.
    pub overpayment: Money,
}

/// A committed stock adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product: Product,
    pub movement: InventoryMovement,
}

/// Transactional operations over the store's data.
#[derive(Debug, Clone)]
pub struct StoreService {
    pool: SqlitePool,
}

impl StoreService {
    pub fn new(pool: SqlitePool) -> Self {
        StoreService { pool }
    }

    /// Registers a sale with its lines, stock movements and deposit.
    pub async fn register_sale(&self, input: &NewSale) -> DbResult<RegisteredSale> {
        precheck_sale(input)?;

        let mut tx = self.pool.begin().await?;

        match register_sale_tx(&mut tx, input).await {
            Ok(registered) => {
                tx.commit().await?;
                info!(
                    code = %registered.sale.code,
                    total = registered.sale.total_cents,
                    paid = registered.sale.amount_paid_cents,
                    status = %registered.sale.status,
                    lines = registered.details.len(),
                    "Sale registered"
                );
                Ok(registered)
            }
            Err(e) => {
                warn!(error = %e, "Sale registration rolled back");
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// Applies a payment to an existing sale.
    ///
    /// Overpayment is accepted: the balance goes negative (customer credit)
    /// and the receipt reports how much was overpaid.
    pub async fn register_payment(&self, input: &NewPayment) -> DbResult<PaymentReceipt> {
        let mut tx = self.pool.begin().await?;

        match register_payment_tx(&mut tx, input).await {
            Ok(receipt) => {
                tx.commit().await?;
                info!(
                    code = %receipt.sale.code,
                    amount = receipt.payment.amount_cents,
                    balance = receipt.sale.balance_due_cents,
                    status = %receipt.sale.status,
                    "Payment registered"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(error = %e, sale_id = %input.sale_id, "Payment rolled back");
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// Moves a product's stock by `delta` and records why.
    ///
    /// The reason is stored trimmed and uppercased. Stock never goes below
    /// zero: an outgoing adjustment larger than what is on hand fails with
    /// `InsufficientStock` and changes nothing.
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        delta: i64,
        reason: &str,
    ) -> DbResult<StockAdjustment> {
        validate_stock_delta(delta)?;
        let reason = normalize_reason(reason)?;

        let mut tx = self.pool.begin().await?;

        match adjust_stock_tx(&mut tx, product_id, delta, &reason).await {
            Ok(adjustment) => {
                tx.commit().await?;
                info!(
                    code = %adjustment.product.code,
                    delta = delta,
                    stock = adjustment.product.current_stock,
                    reason = %reason,
                    "Stock adjusted"
                );
                Ok(adjustment)
            }
            Err(e) => {
                warn!(error = %e, product_id = %product_id, "Stock adjustment rolled back");
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// Issues the next code of `kind` on its own.
    pub async fn next_code(&self, kind: CodeKind) -> DbResult<String> {
        let value = counter::next_value(&self.pool, kind).await?;
        let code = kind.format(value);
        debug!(kind = %kind, code = %code, "Issued code");
        Ok(code)
    }

    /// Assigns invoice and control numbers to a sale, once.
    pub async fn issue_invoice(&self, sale_id: &str) -> DbResult<Sale> {
        let mut tx = self.pool.begin().await?;

        match issue_invoice_tx(&mut tx, sale_id).await {
            Ok(sale) => {
                tx.commit().await?;
                info!(
                    code = %sale.code,
                    invoice = sale.invoice_number.as_deref().unwrap_or_default(),
                    control = sale.control_number.as_deref().unwrap_or_default(),
                    "Invoice issued"
                );
                Ok(sale)
            }
            Err(e) => {
                warn!(error = %e, sale_id = %sale_id, "Invoice issue rolled back");
                tx.rollback().await?;
                Err(e)
            }
        }
    }
}

// =============================================================================
// Transaction bodies
// =============================================================================

/// Shape checks that need no database access.
fn precheck_sale(input: &NewSale) -> DbResult<()> {
    if input.lines.is_empty() {
        return Err(CoreError::EmptySale.into());
    }
    if input.lines.len() > MAX_SALE_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_SALE_LINES,
        }
        .into());
    }
    for line in &input.lines {
        validate_quantity(line.quantity).map_err(|e| match e {
            siconi_core::ValidationError::OutOfRange { max, .. } => CoreError::QuantityTooLarge {
                requested: line.quantity,
                max,
            },
            other => CoreError::Validation(other),
        })?;
        if let Some(price) = line.unit_price {
            validate_price("unit price", price)?;
        }
    }
    if input.amount_paid.is_negative() {
        return Err(CoreError::InvalidPaymentAmount {
            reason: "deposit cannot be negative".to_string(),
        }
        .into());
    }
    if input.exchange_rate != 0.0 {
        validate_exchange_rate(input.exchange_rate)?;
    }
    Ok(())
}

async fn register_sale_tx(conn: &mut SqliteConnection, input: &NewSale) -> DbResult<RegisteredSale> {
    let client_id = clean_opt(&input.client_id);
    if let Some(id) = &client_id {
        if ClientRepository::find_by_id(&mut *conn, id).await?.is_none() {
            return Err(CoreError::ClientNotFound(id.clone()).into());
        }
    }

    // Resolve every line's product and price before writing anything
    let mut products = Vec::with_capacity(input.lines.len());
    let mut lines = Vec::with_capacity(input.lines.len());
    for line in &input.lines {
        let product = ProductRepository::find_by_id(&mut *conn, &line.product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        let unit_price = line.unit_price.unwrap_or_else(|| product.sale_price());
        lines.push(SaleLine::new(line.quantity, unit_price));
        products.push(product);
    }

    let totals = SaleTotals::compute(&lines, input.amount_paid)?;

    let code = CodeKind::Order.format(counter::next_value(&mut *conn, CodeKind::Order).await?);
    let now = Utc::now();
    let exchange_rate = if input.exchange_rate == 0.0 {
        DEFAULT_EXCHANGE_RATE
    } else {
        input.exchange_rate
    };

    let sale = Sale {
        id: new_id(),
        code,
        client_id,
        total_cents: totals.total.cents(),
        amount_paid_cents: totals.amount_paid.cents(),
        balance_due_cents: totals.balance_due.cents(),
        exchange_rate,
        status: totals.status,
        invoice_number: None,
        control_number: None,
        notes: clean_opt(&input.notes),
        created_at: now,
        updated_at: now,
        delivered_at: None,
    };

    debug!(code = %sale.code, total = sale.total_cents, "Writing sale");
    SaleRepository::insert_header(&mut *conn, &sale).await?;

    let mut details = Vec::with_capacity(lines.len());
    for (product, line) in products.iter().zip(&lines) {
        let detail = SaleDetail {
            id: new_id(),
            sale_id: sale.id.clone(),
            product_id: product.id.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            subtotal_cents: line.subtotal().cents(),
        };
        SaleRepository::insert_detail(&mut *conn, &detail).await?;
        details.push(detail);
    }

    let observation = format!("VENTA {}", sale.code);
    for (product, line) in products.iter().zip(&lines) {
        take_stock(&mut *conn, product, line.quantity).await?;

        let movement = InventoryMovement {
            id: new_id(),
            product_id: product.id.clone(),
            quantity: line.quantity,
            kind: MovementKind::Salida,
            observation: observation.clone(),
            sale_id: Some(sale.id.clone()),
            created_at: now,
        };
        InventoryRepository::insert(&mut *conn, &movement).await?;
    }

    if totals.amount_paid.is_positive() {
        let payment = Payment {
            id: new_id(),
            sale_id: sale.id.clone(),
            paid_at: now,
            amount_cents: totals.amount_paid.cents(),
            method: input.payment_method,
            reference: None,
            notes: Some("ABONO INICIAL".to_string()),
        };
        PaymentRepository::insert(&mut *conn, &payment).await?;
    }

    if totals.overpayment.is_positive() {
        warn!(
            code = %sale.code,
            overpayment = totals.overpayment.cents(),
            "Deposit exceeds sale total, keeping the excess as credit"
        );
    }

    Ok(RegisteredSale {
        sale,
        details,
        overpayment: totals.overpayment,
    })
}

/// Guarded decrement for one sale line.
async fn take_stock(conn: &mut SqliteConnection, product: &Product, quantity: i64) -> DbResult<()> {
    if ProductRepository::adjust_stock_guarded(&mut *conn, &product.id, -quantity).await? {
        return Ok(());
    }

    let available = ProductRepository::find_by_id(&mut *conn, &product.id)
        .await?
        .map(|p| p.current_stock)
        .unwrap_or(0);

    Err(CoreError::InsufficientStock {
        code: product.code.clone(),
        available,
        requested: quantity,
    }
    .into())
}

async fn register_payment_tx(
    conn: &mut SqliteConnection,
    input: &NewPayment,
) -> DbResult<PaymentReceipt> {
    let sale = SaleRepository::find_by_id(&mut *conn, &input.sale_id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(input.sale_id.clone()))?;

    let applied = ledger::apply_payment(sale.status, sale.total(), sale.amount_paid(), input.amount)?;

    let payment = Payment {
        id: new_id(),
        sale_id: sale.id.clone(),
        paid_at: Utc::now(),
        amount_cents: input.amount.cents(),
        method: input.method,
        reference: clean_opt(&input.reference),
        notes: clean_opt(&input.notes),
    };
    PaymentRepository::insert(&mut *conn, &payment).await?;

    // The UPDATE is the single writer of amount_paid / balance_due
    let mut updated = SaleRepository::apply_payment_amount(&mut *conn, &sale.id, payment.amount_cents).await?;

    let status = ledger::status_after_payment(updated.status, updated.total(), updated.amount_paid());
    if status != updated.status {
        SaleRepository::set_status(&mut *conn, &updated.id, status).await?;
        debug!(code = %updated.code, from = %updated.status, to = %status, "Sale status advanced");
        updated.status = status;
    }

    if applied.overpayment.is_positive() {
        warn!(
            code = %updated.code,
            overpayment = applied.overpayment.cents(),
            credit = -updated.balance_due_cents,
            "Payment exceeds balance due, keeping the excess as credit"
        );
    }

    Ok(PaymentReceipt {
        payment,
        sale: updated,
        overpayment: applied.overpayment,
    })
}

async fn adjust_stock_tx(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: i64,
    reason: &str,
) -> DbResult<StockAdjustment> {
    let product = ProductRepository::find_by_id(&mut *conn, product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

    if !ProductRepository::adjust_stock_guarded(&mut *conn, product_id, delta).await? {
        return Err(CoreError::InsufficientStock {
            code: product.code,
            available: product.current_stock,
            requested: -delta,
        }
        .into());
    }

    let movement = InventoryMovement {
        id: new_id(),
        product_id: product.id.clone(),
        quantity: delta.abs(),
        kind: MovementKind::from_delta(delta),
        observation: reason.to_string(),
        sale_id: None,
        created_at: Utc::now(),
    };
    InventoryRepository::insert(&mut *conn, &movement).await?;

    let product = ProductRepository::find_by_id(&mut *conn, product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

    Ok(StockAdjustment { product, movement })
}

async fn issue_invoice_tx(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Sale> {
    let sale = SaleRepository::find_by_id(&mut *conn, sale_id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

    if let Some(invoice_number) = sale.invoice_number {
        return Err(CoreError::InvoiceAlreadyIssued {
            sale_code: sale.code,
            invoice_number,
        }
        .into());
    }

    let invoice = CodeKind::Invoice.format(counter::next_value(&mut *conn, CodeKind::Invoice).await?);
    let control = CodeKind::Control.format(counter::next_value(&mut *conn, CodeKind::Control).await?);

    if !SaleRepository::assign_invoice(&mut *conn, sale_id, &invoice, &control).await? {
        return Err(CoreError::InvoiceAlreadyIssued {
            sale_code: sale.code,
            invoice_number: invoice,
        }
        .into());
    }

    SaleRepository::find_by_id(&mut *conn, sale_id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use siconi_core::{NewProduct, SaleLineInput};

    async fn setup_with_product(stock: i64) -> (Database, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&NewProduct {
                code: "LEN-001".to_string(),
                name: "Lentes de natación".to_string(),
                sale_price: Money::from_cents(1500),
                cost_price: Money::from_cents(800),
                initial_stock: stock,
                ..Default::default()
            })
            .await
            .unwrap();
        (db, product)
    }

    fn one_line(product: &Product, quantity: i64) -> NewSale {
        NewSale {
            lines: vec![SaleLineInput {
                product_id: product.id.clone(),
                quantity,
                unit_price: None,
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_next_code_sequence() {
        let (db, _) = setup_with_product(0).await;
        let store = db.store();

        assert_eq!(store.next_code(CodeKind::Order).await.unwrap(), "PED-0001");
        assert_eq!(store.next_code(CodeKind::Order).await.unwrap(), "PED-0002");
        assert_eq!(store.next_code(CodeKind::Invoice).await.unwrap(), "00000001");
        assert_eq!(store.next_code(CodeKind::Control).await.unwrap(), "00-00000001");
    }

    #[tokio::test]
    async fn test_unit_price_defaults_to_sale_price() {
        let (db, product) = setup_with_product(5).await;

        let registered = db.store().register_sale(&one_line(&product, 2)).await.unwrap();

        assert_eq!(registered.sale.code, "PED-0001");
        assert_eq!(registered.details[0].unit_price_cents, 1500);
        assert_eq!(registered.sale.total_cents, 3000);
        assert_eq!(registered.sale.exchange_rate, DEFAULT_EXCHANGE_RATE);
        assert_eq!(registered.sale.status, siconi_core::SaleStatus::Pendiente);
        assert!(db.payments().list_for_sale(&registered.sale.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_precheck_rejects_before_writing() {
        let (db, product) = setup_with_product(5).await;
        let store = db.store();

        let err = store.register_sale(&NewSale::default()).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptySale)));

        let err = store.register_sale(&one_line(&product, 1000)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::QuantityTooLarge { .. })));

        let mut sale = one_line(&product, 1);
        sale.amount_paid = Money::from_cents(-1);
        let err = store.register_sale(&sale).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidPaymentAmount { .. })));

        assert_eq!(store.next_code(CodeKind::Order).await.unwrap(), "PED-0001");
    }

    #[tokio::test]
    async fn test_inactive_product_cannot_be_sold() {
        let (db, product) = setup_with_product(5).await;
        db.products().deactivate(&product.id).await.unwrap();

        let err = db.store().register_sale(&one_line(&product, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_issue_invoice_once() {
        let (db, product) = setup_with_product(5).await;
        let store = db.store();
        let registered = store.register_sale(&one_line(&product, 1)).await.unwrap();

        let sale = store.issue_invoice(&registered.sale.id).await.unwrap();
        assert_eq!(sale.invoice_number.as_deref(), Some("00000001"));
        assert_eq!(sale.control_number.as_deref(), Some("00-00000001"));

        let err = store.issue_invoice(&registered.sale.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvoiceAlreadyIssued { .. })));

        // The failed attempt did not consume a number
        assert_eq!(store.next_code(CodeKind::Invoice).await.unwrap(), "00000002");
    }

    #[tokio::test]
    async fn test_adjust_stock_validates_input() {
        let (db, product) = setup_with_product(5).await;
        let store = db.store();

        assert!(store.adjust_stock(&product.id, 0, "CONTEO").await.is_err());
        assert!(store.adjust_stock(&product.id, 1, "   ").await.is_err());

        let err = store.adjust_stock("missing", 1, "CONTEO").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
    }
}
