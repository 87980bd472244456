//! `siconi report ...`
//!
//! Reports are read-only. `--out` also writes the JSON into the configured
//! reports directory as `resumen_<from>_<to>.json`.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use serde_json::{json, Value};
use siconi_core::Money;
use tracing::info;

use super::{date_range, to_json, Context};
use crate::error::CliResult;

#[derive(Subcommand)]
pub enum ReportAction {
    /// Sales, profit, top products and payments for a period
    Summary {
        /// First day (defaults to --to)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day, inclusive (defaults to today)
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value_t = 5)]
        top: u32,
        /// Also write the report to the reports directory
        #[arg(long)]
        out: bool,
    },
    /// Orders that still owe money, oldest first
    Receivables,
}

pub async fn run(ctx: &Context, action: ReportAction) -> CliResult<Value> {
    let reports = ctx.db.reports();

    match action {
        ReportAction::Summary { from, to, top, out } => {
            let range = date_range(from, to)?;
            let report = reports.period_report(&range, top).await;
            let low_stock = reports.low_stock_or_default().await;

            let mut value = json!({
                "store": ctx.config.store_name,
                "generated_at": Utc::now(),
                "revenue": ctx.config.format_currency(Money::from_cents(report.summary.revenue_cents)),
                "profit": ctx.config.format_currency(Money::from_cents(report.summary.profit_cents)),
                "outstanding": ctx.config.format_currency(Money::from_cents(report.outstanding_cents)),
                "report": report,
                "low_stock": low_stock,
            });

            if out {
                std::fs::create_dir_all(&ctx.config.reports_dir)?;
                let path = ctx
                    .config
                    .reports_dir
                    .join(format!("resumen_{}_{}.json", range.from, range.to));
                std::fs::write(&path, serde_json::to_vec_pretty(&value)?)?;
                info!(path = %path.display(), "Report written");
                value["written_to"] = json!(path);
            }

            Ok(value)
        }
        ReportAction::Receivables => {
            let receivables = reports.receivables().await?;
            let outstanding: i64 = receivables.iter().map(|r| r.balance_due_cents).sum();
            Ok(json!({
                "count": receivables.len(),
                "outstanding": ctx.config.format_currency(Money::from_cents(outstanding)),
                "sales": to_json(&receivables)?,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use siconi_core::{NewProduct, NewSale, SaleLineInput};

    async fn context_with_sale() -> Context {
        let ctx = testing::context().await;
        let product = ctx
            .db
            .products()
            .insert(&NewProduct {
                code: "TRJ-040".to_string(),
                name: "Traje dos piezas".to_string(),
                sale_price: Money::from_cents(1800),
                cost_price: Money::from_cents(1000),
                initial_stock: 4,
                min_stock: 3,
                ..Default::default()
            })
            .await
            .unwrap();
        ctx.db
            .store()
            .register_sale(&NewSale {
                lines: vec![SaleLineInput {
                    product_id: product.id,
                    quantity: 2,
                    unit_price: None,
                }],
                amount_paid: Money::from_cents(1000),
                ..Default::default()
            })
            .await
            .unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_summary_written_to_reports_dir() {
        let ctx = context_with_sale().await;

        let value = run(
            &ctx,
            ReportAction::Summary {
                from: None,
                to: None,
                top: 5,
                out: true,
            },
        )
        .await
        .unwrap();

        assert_eq!(value["report"]["summary"]["revenue_cents"], 3600);
        assert_eq!(value["profit"], "$16.00");
        assert_eq!(value["low_stock"].as_array().unwrap().len(), 1);

        let path = value["written_to"].as_str().unwrap();
        let written: Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(written["store"], "Taller de Prueba");

        std::fs::remove_dir_all(&ctx.config.reports_dir).ok();
    }

    #[tokio::test]
    async fn test_receivables() {
        let ctx = context_with_sale().await;

        let value = run(&ctx, ReportAction::Receivables).await.unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["outstanding"], "$26.00");
        assert_eq!(value["sales"][0]["code"], "PED-0001");
    }
}
