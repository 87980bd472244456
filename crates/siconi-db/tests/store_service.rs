//! End-to-end behavior of the store service against a fresh in-memory
//! database: stock, balances, statuses and the audit trail move together or
//! not at all.

use siconi_core::codes::CodeKind;
use siconi_core::{
    CoreError, Money, MovementKind, NewClient, NewPayment, NewProduct, NewSale, PaymentMethod,
    Product, SaleLineInput, SaleStatus, ValidationError,
};
use siconi_db::repository::counter;
use siconi_db::{Database, DbConfig, DbError};

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn product(db: &Database, code: &str, price_cents: i64, stock: i64) -> Product {
    db.products()
        .insert(&NewProduct {
            code: code.to_string(),
            name: format!("Producto {}", code),
            sale_price: Money::from_cents(price_cents),
            cost_price: Money::from_cents(price_cents / 2),
            initial_stock: stock,
            ..Default::default()
        })
        .await
        .unwrap()
}

fn line(product: &Product, quantity: i64) -> SaleLineInput {
    SaleLineInput {
        product_id: product.id.clone(),
        quantity,
        unit_price: None,
    }
}

fn payment(sale_id: &str, cents: i64) -> NewPayment {
    NewPayment {
        sale_id: sale_id.to_string(),
        amount: Money::from_cents(cents),
        method: PaymentMethod::Transferencia,
        reference: Some("REF-123".to_string()),
        notes: None,
    }
}

async fn count(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db.pool())
        .await
        .unwrap()
}

async fn stock_of(db: &Database, id: &str) -> i64 {
    db.products().get_by_id(id).await.unwrap().unwrap().current_stock
}

#[tokio::test]
async fn workshop_deposit_then_settlement() {
    let db = setup().await;
    let store = db.store();
    let suit = product(&db, "TRJ-001", 2000, 10).await;

    let registered = store
        .register_sale(&NewSale {
            lines: vec![line(&suit, 3)],
            amount_paid: Money::from_cents(3000),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(registered.sale.code, "PED-0001");
    assert_eq!(registered.sale.total_cents, 6000);
    assert_eq!(registered.sale.balance_due_cents, 3000);
    assert_eq!(registered.sale.status, SaleStatus::Abonado);
    assert_eq!(stock_of(&db, &suit.id).await, 7);

    let receipt = store
        .register_payment(&payment(&registered.sale.id, 3000))
        .await
        .unwrap();

    assert_eq!(receipt.sale.amount_paid_cents, 6000);
    assert_eq!(receipt.sale.balance_due_cents, 0);
    assert_eq!(receipt.sale.status, SaleStatus::Pagado);
    assert_eq!(receipt.overpayment, Money::zero());

    let stored = db.sales().get_by_id(&registered.sale.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SaleStatus::Pagado);
    assert_eq!(stored.balance_due_cents, 0);
}

#[tokio::test]
async fn sale_decrements_each_line_and_logs_movements() {
    let db = setup().await;
    let suit = product(&db, "TRJ-002", 1800, 5).await;
    let cap = product(&db, "GOR-001", 800, 20).await;

    let registered = db
        .store()
        .register_sale(&NewSale {
            lines: vec![
                line(&suit, 2),
                SaleLineInput {
                    unit_price: Some(Money::from_cents(700)),
                    ..line(&cap, 4)
                },
            ],
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(registered.sale.total_cents, 2 * 1800 + 4 * 700);
    assert_eq!(
        registered.sale.balance_due_cents,
        registered.sale.total_cents - registered.sale.amount_paid_cents
    );
    assert_eq!(registered.sale.status, SaleStatus::Pendiente);
    assert_eq!(stock_of(&db, &suit.id).await, 3);
    assert_eq!(stock_of(&db, &cap.id).await, 16);

    let details = db.sales().details(&registered.sale.id).await.unwrap();
    assert_eq!(details.len(), 2);

    let movements = db.inventory().for_sale(&registered.sale.id).await.unwrap();
    assert_eq!(movements.len(), 2);
    assert!(movements.iter().all(|m| m.kind == MovementKind::Salida));
    assert!(movements.iter().all(|m| m.observation == "VENTA PED-0001"));
}

#[tokio::test]
async fn insufficient_stock_leaves_nothing_behind() {
    let db = setup().await;
    let plenty = product(&db, "BER-001", 1200, 50).await;
    let scarce = product(&db, "LEN-001", 1500, 2).await;

    let err = db
        .store()
        .register_sale(&NewSale {
            lines: vec![line(&plenty, 5), line(&scarce, 3)],
            amount_paid: Money::from_cents(1000),
            ..Default::default()
        })
        .await
        .unwrap_err();

    match err {
        DbError::Domain(CoreError::InsufficientStock {
            code,
            available,
            requested,
        }) => {
            assert_eq!(code, "LEN-001");
            assert_eq!(available, 2);
            assert_eq!(requested, 3);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(count(&db, "sales").await, 0);
    assert_eq!(count(&db, "sale_details").await, 0);
    assert_eq!(count(&db, "payments").await, 0);
    assert_eq!(stock_of(&db, &plenty.id).await, 50);
    assert_eq!(stock_of(&db, &scarce.id).await, 2);

    // The order number was not consumed
    assert_eq!(counter::current_value(db.pool(), CodeKind::Order).await.unwrap(), 0);
}

#[tokio::test]
async fn failure_during_stock_update_rolls_back_everything() {
    let db = setup().await;
    let suit = product(&db, "TRJ-003", 2000, 10).await;

    sqlx::query(
        "CREATE TRIGGER fail_stock BEFORE UPDATE OF current_stock ON products \
         BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let result = db
        .store()
        .register_sale(&NewSale {
            lines: vec![line(&suit, 1)],
            amount_paid: Money::from_cents(500),
            ..Default::default()
        })
        .await;

    assert!(result.is_err());
    assert_eq!(count(&db, "sales").await, 0);
    assert_eq!(count(&db, "sale_details").await, 0);
    assert_eq!(count(&db, "payments").await, 0);
    assert_eq!(stock_of(&db, &suit.id).await, 10);

    sqlx::query("DROP TRIGGER fail_stock")
        .execute(db.pool())
        .await
        .unwrap();

    let registered = db
        .store()
        .register_sale(&NewSale {
            lines: vec![line(&suit, 1)],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(registered.sale.code, "PED-0001");
}

#[tokio::test]
async fn payments_move_balance_by_exact_amount() {
    let db = setup().await;
    let store = db.store();
    let suit = product(&db, "TRJ-004", 2500, 10).await;

    let sale = store
        .register_sale(&NewSale {
            lines: vec![line(&suit, 2)],
            amount_paid: Money::from_cents(1000),
            payment_method: PaymentMethod::Efectivo,
            ..Default::default()
        })
        .await
        .unwrap()
        .sale;

    let mut paid = sale.amount_paid_cents;
    let mut balance = sale.balance_due_cents;
    for amount in [1500, 1250, 1249] {
        let receipt = store.register_payment(&payment(&sale.id, amount)).await.unwrap();
        assert_eq!(receipt.sale.amount_paid_cents, paid + amount);
        assert_eq!(receipt.sale.balance_due_cents, balance - amount);
        paid += amount;
        balance -= amount;
    }

    // One cent left counts as paid
    let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(stored.balance_due_cents, 1);
    assert_eq!(stored.status, SaleStatus::Pagado);

    // The deposit is a payment row too
    let total = db.payments().total_for_sale(&sale.id).await.unwrap();
    assert_eq!(total, stored.amount_paid_cents);
    assert_eq!(db.payments().list_for_sale(&sale.id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn overpayment_becomes_credit() {
    let db = setup().await;
    let store = db.store();
    let cap = product(&db, "GOR-002", 500, 3).await;

    let sale = store
        .register_sale(&NewSale {
            lines: vec![line(&cap, 1)],
            ..Default::default()
        })
        .await
        .unwrap()
        .sale;

    let receipt = store.register_payment(&payment(&sale.id, 800)).await.unwrap();
    assert_eq!(receipt.overpayment, Money::from_cents(300));
    assert_eq!(receipt.sale.balance_due_cents, -300);
    assert_eq!(receipt.sale.status, SaleStatus::Pagado);
}

#[tokio::test]
async fn oversized_amounts_are_refused_before_any_write() {
    let db = setup().await;
    let store = db.store();
    let suit = product(&db, "TRJ-001", 2000, 10).await;
    let huge: Money = "92233720368547758".parse().unwrap();

    let err = store
        .register_sale(&NewSale {
            lines: vec![SaleLineInput {
                product_id: suit.id.clone(),
                quantity: 2,
                unit_price: Some(huge),
            }],
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
    ));
    assert_eq!(count(&db, "sales").await, 0);
    assert_eq!(stock_of(&db, &suit.id).await, 10);

    let err = store
        .register_sale(&NewSale {
            lines: vec![line(&suit, 1)],
            amount_paid: huge,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InvalidPaymentAmount { .. })));
    assert_eq!(count(&db, "sales").await, 0);

    let sale = store
        .register_sale(&NewSale {
            lines: vec![line(&suit, 3)],
            amount_paid: Money::from_cents(3000),
            ..Default::default()
        })
        .await
        .unwrap()
        .sale;

    let err = store.register_payment(&payment(&sale.id, huge.cents())).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InvalidPaymentAmount { .. })));

    let after = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(after.amount_paid_cents, 3000);
    assert_eq!(after.balance_due_cents, after.total_cents - after.amount_paid_cents);
    assert_eq!(count(&db, "payments").await, 1);
}

#[tokio::test]
async fn payment_validation_and_unknown_sale() {
    let db = setup().await;
    let store = db.store();

    let err = store.register_payment(&payment("no-such-sale", 100)).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::SaleNotFound(_))));

    let cap = product(&db, "GOR-003", 500, 3).await;
    let sale = store
        .register_sale(&NewSale {
            lines: vec![line(&cap, 1)],
            ..Default::default()
        })
        .await
        .unwrap()
        .sale;

    let err = store.register_payment(&payment(&sale.id, 0)).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InvalidPaymentAmount { .. })));
    assert_eq!(count(&db, "payments").await, 0);
}

#[tokio::test]
async fn delivered_sale_keeps_status_after_payment() {
    let db = setup().await;
    let store = db.store();
    let suit = product(&db, "TRJ-005", 2000, 4).await;

    let sale = store
        .register_sale(&NewSale {
            lines: vec![line(&suit, 1)],
            amount_paid: Money::from_cents(500),
            ..Default::default()
        })
        .await
        .unwrap()
        .sale;

    let delivered = db.sales().mark_delivered(&sale.id).await.unwrap();
    assert_eq!(delivered.status, SaleStatus::Entregado);
    assert!(delivered.delivered_at.is_some());

    let receipt = store.register_payment(&payment(&sale.id, 1500)).await.unwrap();
    assert_eq!(receipt.sale.balance_due_cents, 0);
    assert_eq!(receipt.sale.status, SaleStatus::Entregado);

    let err = db.sales().mark_delivered(&sale.id).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InvalidSaleStatus { .. })));
}

#[tokio::test]
async fn stock_adjustment_audit_trail() {
    let db = setup().await;
    let store = db.store();
    let lens = product(&db, "LEN-002", 1000, 6).await;

    let before = db.inventory().history(&lens.id, 50).await.unwrap().len();

    let added = store.adjust_stock(&lens.id, 4, "compra proveedor").await.unwrap();
    assert_eq!(added.product.current_stock, 10);
    assert_eq!(added.movement.quantity, 4);
    assert_eq!(added.movement.kind, MovementKind::Entrada);
    assert_eq!(added.movement.observation, "COMPRA PROVEEDOR");

    let removed = store.adjust_stock(&lens.id, -3, "merma").await.unwrap();
    assert_eq!(removed.product.current_stock, 7);
    assert_eq!(removed.movement.quantity, 3);
    assert_eq!(removed.movement.kind, MovementKind::Salida);

    let history = db.inventory().history(&lens.id, 50).await.unwrap();
    assert_eq!(history.len(), before + 2);

    // Net change of the trail equals the stock on hand
    assert_eq!(db.inventory().net_change(&lens.id).await.unwrap(), 7);
}

#[tokio::test]
async fn stock_adjustment_cannot_go_negative() {
    let db = setup().await;
    let lens = product(&db, "LEN-003", 1000, 2).await;
    let before = db.inventory().history(&lens.id, 50).await.unwrap().len();

    let err = db.store().adjust_stock(&lens.id, -3, "conteo").await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock {
            available: 2,
            requested: 3,
            ..
        })
    ));

    assert_eq!(stock_of(&db, &lens.id).await, 2);
    assert_eq!(db.inventory().history(&lens.id, 50).await.unwrap().len(), before);
}

#[tokio::test]
async fn sale_for_client_and_unknown_client() {
    let db = setup().await;
    let store = db.store();
    let suit = product(&db, "TRJ-006", 2000, 5).await;
    let client = db
        .clients()
        .insert(&NewClient {
            name: "Ana Gómez".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let registered = store
        .register_sale(&NewSale {
            client_id: Some(client.id.clone()),
            lines: vec![line(&suit, 1)],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(registered.sale.client_id.as_deref(), Some(client.id.as_str()));

    let err = store
        .register_sale(&NewSale {
            client_id: Some("missing-client".to_string()),
            lines: vec![line(&suit, 1)],
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::ClientNotFound(_))));
    assert_eq!(stock_of(&db, &suit.id).await, 4);
}

#[tokio::test]
async fn codes_are_sequential_across_sales_and_invoices() {
    let db = setup().await;
    let store = db.store();
    let cap = product(&db, "GOR-004", 500, 10).await;

    let mut codes = Vec::new();
    for _ in 0..3 {
        let registered = store
            .register_sale(&NewSale {
                lines: vec![line(&cap, 1)],
                ..Default::default()
            })
            .await
            .unwrap();
        codes.push(registered.sale);
    }
    let names: Vec<&str> = codes.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(names, ["PED-0001", "PED-0002", "PED-0003"]);

    let second = store.issue_invoice(&codes[1].id).await.unwrap();
    let first = store.issue_invoice(&codes[0].id).await.unwrap();
    assert_eq!(second.invoice_number.as_deref(), Some("00000001"));
    assert_eq!(first.invoice_number.as_deref(), Some("00000002"));
    assert_eq!(first.control_number.as_deref(), Some("00-00000002"));
}
