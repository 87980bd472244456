//! `siconi supplier ...`

use clap::Subcommand;
use serde_json::Value;
use siconi_core::NewSupplier;

use super::{to_json, Context};
use crate::error::CliResult;

#[derive(Subcommand)]
pub enum SupplierAction {
    Add {
        name: String,
        /// RIF
        #[arg(long)]
        tax_id: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

pub async fn run(ctx: &Context, action: SupplierAction) -> CliResult<Value> {
    let suppliers = ctx.db.suppliers();

    match action {
        SupplierAction::Add {
            name,
            tax_id,
            phone,
            email,
            address,
        } => to_json(
            &suppliers
                .insert(&NewSupplier {
                    name,
                    tax_id,
                    phone,
                    email,
                    address,
                })
                .await?,
        ),
        SupplierAction::List { search, limit } => {
            to_json(&suppliers.search(search.as_deref().unwrap_or(""), limit).await?)
        }
    }
}
