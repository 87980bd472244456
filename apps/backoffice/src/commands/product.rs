//! `siconi product ...`

use clap::Subcommand;
use serde_json::{json, Value};
use siconi_core::{Money, NewProduct, ProductUpdate};

use super::{resolve_product, to_json, Context};
use crate::error::{CliError, CliResult};

#[derive(Subcommand)]
pub enum ProductAction {
    /// Add a product to the catalog
    Add {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        /// Category name, e.g. "TRAJES DE BAÑO"
        #[arg(long)]
        category: Option<String>,
        /// Supplier id
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Sale price, e.g. 20 or 19.99
        #[arg(long)]
        price: Money,
        #[arg(long, default_value = "0")]
        cost: Money,
        /// Opening stock, logged as an ENTRADA movement
        #[arg(long, default_value_t = 0)]
        stock: i64,
        #[arg(long, default_value_t = 0)]
        min_stock: i64,
    },
    /// Search or list products
    List {
        /// Matches code or name
        #[arg(long)]
        search: Option<String>,
        /// Include deactivated products
        #[arg(long)]
        all: bool,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// One product with its latest stock movements
    Show {
        /// Product code or id
        product: String,
        #[arg(long, default_value_t = 10)]
        history: u32,
    },
    /// Change name, prices or minimum stock (never the stock itself)
    Update {
        product: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price: Option<Money>,
        #[arg(long)]
        cost: Option<Money>,
        #[arg(long)]
        min_stock: Option<i64>,
    },
    /// Hide a product from sales and searches
    Deactivate { product: String },
    /// Active products at or below their minimum stock
    LowStock,
}

pub async fn run(ctx: &Context, action: ProductAction) -> CliResult<Value> {
    let products = ctx.db.products();

    match action {
        ProductAction::Add {
            code,
            name,
            category,
            supplier,
            description,
            price,
            cost,
            stock,
            min_stock,
        } => {
            let category_id = match category {
                Some(name) => Some(
                    ctx.db
                        .categories()
                        .get_by_name(&name)
                        .await?
                        .ok_or_else(|| CliError::not_found("Category", &name))?
                        .id,
                ),
                None => None,
            };

            let product = products
                .insert(&NewProduct {
                    code,
                    name,
                    description,
                    category_id,
                    supplier_id: supplier,
                    cost_price: cost,
                    sale_price: price,
                    initial_stock: stock,
                    min_stock,
                })
                .await?;
            to_json(&product)
        }

        ProductAction::List { search, all, limit } => {
            let list = match search {
                Some(query) => products.search(&query, limit).await?,
                None => products.list(all, limit).await?,
            };
            to_json(&list)
        }

        ProductAction::Show { product, history } => {
            let product = resolve_product(ctx, &product).await?;
            let movements = ctx.db.inventory().history(&product.id, history).await?;
            Ok(json!({
                "product": product,
                "low_stock": product.is_low_stock(),
                "sale_price": ctx.config.format_currency(product.sale_price()),
                "movements": movements,
            }))
        }

        ProductAction::Update {
            product,
            name,
            description,
            price,
            cost,
            min_stock,
        } => {
            let current = resolve_product(ctx, &product).await?;
            let mut changes = ProductUpdate::from(&current);
            if let Some(name) = name {
                changes.name = name;
            }
            if description.is_some() {
                changes.description = description;
            }
            if let Some(price) = price {
                changes.sale_price = price;
            }
            if let Some(cost) = cost {
                changes.cost_price = cost;
            }
            if let Some(min_stock) = min_stock {
                changes.min_stock = min_stock;
            }
            to_json(&products.update(&current.id, &changes).await?)
        }

        ProductAction::Deactivate { product } => {
            let current = resolve_product(ctx, &product).await?;
            products.deactivate(&current.id).await?;
            Ok(json!({ "id": current.id, "code": current.code, "is_active": false }))
        }

        ProductAction::LowStock => to_json(&products.low_stock().await?),
    }
}
