//! `siconi payment ...`

use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::{json, Value};
use siconi_core::{Money, NewPayment, PaymentMethod};

use super::{date_range, resolve_sale, to_json, Context};
use crate::error::CliResult;

#[derive(Subcommand)]
pub enum PaymentAction {
    /// Register a payment against an order
    Add {
        /// Order code (PED-0001) or id
        sale: String,
        amount: Money,
        #[arg(long, default_value = "efectivo")]
        method: PaymentMethod,
        /// Bank or mobile-payment reference
        #[arg(long)]
        reference: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Payments of one order, or of a date range
    List {
        #[arg(long)]
        sale: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

pub async fn run(ctx: &Context, action: PaymentAction) -> CliResult<Value> {
    match action {
        PaymentAction::Add {
            sale,
            amount,
            method,
            reference,
            notes,
        } => {
            let sale = resolve_sale(ctx, &sale).await?;
            let receipt = ctx
                .db
                .store()
                .register_payment(&NewPayment {
                    sale_id: sale.id,
                    amount,
                    method,
                    reference,
                    notes,
                })
                .await?;

            let mut value = to_json(&receipt)?;
            if receipt.overpayment.is_positive() {
                value["credit"] = json!(ctx.config.format_currency(receipt.overpayment));
            }
            Ok(value)
        }
        PaymentAction::List { sale, from, to } => match sale {
            Some(sale) => {
                let sale = resolve_sale(ctx, &sale).await?;
                to_json(&ctx.db.payments().list_for_sale(&sale.id).await?)
            }
            None => to_json(&ctx.db.payments().list(&date_range(from, to)?).await?),
        },
    }
}
