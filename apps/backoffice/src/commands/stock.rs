//! `siconi stock ...`
//!
//! Manual corrections go through the store service so the product row and
//! its audit movement are written together.

use clap::Subcommand;
use serde_json::{json, Value};

use super::{resolve_product, to_json, Context};
use crate::error::CliResult;

#[derive(Subcommand)]
pub enum StockAction {
    /// Add (positive) or remove (negative) units, with a reason
    Adjust {
        /// Product code or id
        product: String,
        /// Signed change, e.g. 5 or -2
        #[arg(allow_negative_numbers = true)]
        delta: i64,
        #[arg(long)]
        reason: String,
    },
    /// Movement history of a product, newest first
    History {
        product: String,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

pub async fn run(ctx: &Context, action: StockAction) -> CliResult<Value> {
    match action {
        StockAction::Adjust {
            product,
            delta,
            reason,
        } => {
            let product = resolve_product(ctx, &product).await?;
            let adjustment = ctx.db.store().adjust_stock(&product.id, delta, &reason).await?;
            to_json(&adjustment)
        }
        StockAction::History { product, limit } => {
            let product = resolve_product(ctx, &product).await?;
            let movements = ctx.db.inventory().history(&product.id, limit).await?;
            Ok(json!({
                "code": product.code,
                "current_stock": product.current_stock,
                "movements": movements,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use siconi_core::{Money, NewProduct};

    #[tokio::test]
    async fn test_adjust_then_history() {
        let ctx = testing::context().await;
        ctx.db
            .products()
            .insert(&NewProduct {
                code: "BER-020".to_string(),
                name: "Bermuda lycra M".to_string(),
                sale_price: Money::from_cents(1200),
                initial_stock: 3,
                ..Default::default()
            })
            .await
            .unwrap();

        let adjusted = run(
            &ctx,
            StockAction::Adjust {
                product: "BER-020".to_string(),
                delta: -2,
                reason: "merma".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(adjusted["product"]["current_stock"], 1);
        assert_eq!(adjusted["movement"]["kind"], "SALIDA");
        assert_eq!(adjusted["movement"]["observation"], "MERMA");

        let history = run(
            &ctx,
            StockAction::History {
                product: "BER-020".to_string(),
                limit: 10,
            },
        )
        .await
        .unwrap();
        assert_eq!(history["movements"].as_array().unwrap().len(), 2);
        assert_eq!(history["movements"][0]["observation"], "MERMA");
    }
}
