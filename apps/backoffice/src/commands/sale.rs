//! `siconi sale ...`
//!
//! Items are given as `CODE:QTY` or `CODE:QTY:PRICE`; without a price the
//! product's current sale price applies.

use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::{json, Value};
use siconi_core::{Money, NewSale, PaymentMethod, SaleLineInput, SaleStatus};
use siconi_db::SaleFilter;

use super::{date_range, resolve_product, resolve_sale, to_json, Context};
use crate::error::{CliError, CliResult};

#[derive(Subcommand)]
pub enum SaleAction {
    /// Register an order, decrement stock and record the deposit
    Register {
        /// Line item, repeatable: CODE:QTY or CODE:QTY:PRICE
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        /// Client id
        #[arg(long)]
        client: Option<String>,
        /// Deposit received now
        #[arg(long, default_value = "0")]
        paid: Money,
        #[arg(long, default_value = "efectivo")]
        method: PaymentMethod,
        /// Exchange rate snapshot (defaults to SICONI_EXCHANGE_RATE)
        #[arg(long)]
        rate: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Header, lines, payments and stock movements of one order
    Show {
        /// Order code (PED-0001) or id
        sale: String,
    },
    List {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        status: Option<SaleStatus>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
    /// Mark an order as handed over to the client
    Deliver { sale: String },
    /// Assign invoice and control numbers
    Invoice { sale: String },
}

pub async fn run(ctx: &Context, action: SaleAction) -> CliResult<Value> {
    match action {
        SaleAction::Register {
            items,
            client,
            paid,
            method,
            rate,
            notes,
        } => {
            let mut lines = Vec::with_capacity(items.len());
            for item in &items {
                let (code, quantity, unit_price) = parse_item(item)?;
                let product = resolve_product(ctx, &code).await?;
                lines.push(SaleLineInput {
                    product_id: product.id,
                    quantity,
                    unit_price,
                });
            }

            let registered = ctx
                .db
                .store()
                .register_sale(&NewSale {
                    client_id: client,
                    lines,
                    amount_paid: paid,
                    payment_method: method,
                    exchange_rate: rate.or(ctx.config.exchange_rate).unwrap_or(0.0),
                    notes,
                })
                .await?;
            to_json(&registered)
        }

        SaleAction::Show { sale } => {
            let sale = resolve_sale(ctx, &sale).await?;
            let details = ctx.db.sales().details(&sale.id).await?;
            let payments = ctx.db.payments().list_for_sale(&sale.id).await?;
            let movements = ctx.db.inventory().for_sale(&sale.id).await?;
            Ok(json!({
                "total": ctx.config.format_currency(sale.total()),
                "balance_due": ctx.config.format_currency(sale.balance_due()),
                "sale": sale,
                "details": details,
                "payments": payments,
                "movements": movements,
            }))
        }

        SaleAction::List {
            from,
            to,
            status,
            client,
            limit,
        } => {
            let range = if from.is_some() || to.is_some() {
                Some(date_range(from, to)?)
            } else {
                None
            };
            let sales = ctx
                .db
                .sales()
                .list(&SaleFilter {
                    range,
                    status,
                    client_id: client,
                    limit,
                })
                .await?;
            to_json(&sales)
        }

        SaleAction::Deliver { sale } => {
            let sale = resolve_sale(ctx, &sale).await?;
            to_json(&ctx.db.sales().mark_delivered(&sale.id).await?)
        }

        SaleAction::Invoice { sale } => {
            let sale = resolve_sale(ctx, &sale).await?;
            to_json(&ctx.db.store().issue_invoice(&sale.id).await?)
        }
    }
}

/// `TRJ-001:3` or `TRJ-001:3:19.50`.
fn parse_item(raw: &str) -> CliResult<(String, i64, Option<Money>)> {
    let mut parts = raw.trim().split(':');
    let bad = || CliError::validation(format!("Invalid item '{}', expected CODE:QTY[:PRICE]", raw));

    let code = parts.next().filter(|c| !c.is_empty()).ok_or_else(bad)?;
    let quantity = parts
        .next()
        .and_then(|q| q.trim().parse::<i64>().ok())
        .ok_or_else(bad)?;
    let price = match parts.next() {
        Some(p) => Some(p.parse::<Money>()?),
        None => None,
    };
    if parts.next().is_some() {
        return Err(bad());
    }

    Ok((code.to_string(), quantity, price))
}
