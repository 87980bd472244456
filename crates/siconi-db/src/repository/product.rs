//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Stock Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  current_stock changes ONLY through:                                   │
//! │                                                                         │
//! │  insert()               opening stock + ENTRADA "INVENTARIO INICIAL"   │
//! │  adjust_stock_guarded() UPDATE ... WHERE current_stock + delta >= 0    │
//! │                         (called by StoreService for sales and audits)  │
//! │                                                                         │
//! │  update() edits name / prices / thresholds and never touches stock.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::inventory::InventoryRepository;
use crate::repository::{clean_opt, like_pattern};
use siconi_core::validation::{
    validate_name, validate_price, validate_product_code, validate_search_query,
    validate_stock_level,
};
use siconi_core::{
    new_id, InventoryMovement, MovementKind, NewProduct, Product, ProductUpdate,
};

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, code, name, description, category_id, supplier_id,
        cost_price_cents, sale_price_cents, current_stock, min_stock,
        is_active, created_at, updated_at
    FROM products
"#;

/// Observation written on the movement of a product's opening stock.
pub const OPENING_STOCK_OBSERVATION: &str = "INVENTARIO INICIAL";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let results = repo.search("gorro", 20).await?;
/// let product = repo.get_by_code("GOR-001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products by code or name (case-insensitive `LIKE`).
    ///
    /// An empty query lists active products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list(false, limit).await;
        }

        let pattern = like_pattern(&query);
        let products = sqlx::query_as::<_, Product>(&format!(
            "{} WHERE is_active = 1 \
               AND (code LIKE ?1 ESCAPE '\\' OR name LIKE ?1 ESCAPE '\\') \
             ORDER BY name LIMIT ?2",
            SELECT_PRODUCT
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists products by name. Inactive (soft-deleted) ones only on request.
    pub async fn list(&self, include_inactive: bool, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{} WHERE (?1 OR is_active = 1) ORDER BY name LIMIT ?2",
            SELECT_PRODUCT
        ))
        .bind(include_inactive)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        Self::find_by_id(&self.pool, id).await
    }

    /// Gets a product by its business code. Codes are stored uppercased, so
    /// the lookup is too.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{} WHERE code = ?1", SELECT_PRODUCT))
            .bind(code.trim().to_uppercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a product. Opening stock, when positive, is recorded as an
    /// ENTRADA movement in the same transaction.
    pub async fn insert(&self, input: &NewProduct) -> DbResult<Product> {
        validate_product_code(&input.code)?;
        validate_name("name", &input.name)?;
        validate_price("cost price", input.cost_price)?;
        validate_price("sale price", input.sale_price)?;
        validate_stock_level("initial stock", input.initial_stock)?;
        validate_stock_level("min stock", input.min_stock)?;

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            code: input.code.trim().to_uppercase(),
            name: input.name.trim().to_string(),
            description: clean_opt(&input.description),
            category_id: clean_opt(&input.category_id),
            supplier_id: clean_opt(&input.supplier_id),
            cost_price_cents: input.cost_price.cents(),
            sale_price_cents: input.sale_price.cents(),
            current_stock: input.initial_stock,
            min_stock: input.min_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, code = %product.code, "Inserting product");

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, description, category_id, supplier_id,
                cost_price_cents, sale_price_cents, current_stock, min_stock,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(product.cost_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.current_stock)
        .bind(product.min_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            tx.rollback().await?;
            return Err(match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.code),
                other => other,
            });
        }

        if product.current_stock > 0 {
            let movement = InventoryMovement {
                id: new_id(),
                product_id: product.id.clone(),
                quantity: product.current_stock,
                kind: MovementKind::Entrada,
                observation: OPENING_STOCK_OBSERVATION.to_string(),
                sale_id: None,
                created_at: now,
            };
            if let Err(e) = InventoryRepository::insert(&mut *tx, &movement).await {
                tx.rollback().await?;
                return Err(e);
            }
        }

        tx.commit().await?;

        info!(id = %product.id, code = %product.code, stock = product.current_stock, "Product created");
        Ok(product)
    }

    /// Updates descriptive fields and prices. Stock is never written here.
    pub async fn update(&self, id: &str, changes: &ProductUpdate) -> DbResult<Product> {
        validate_name("name", &changes.name)?;
        validate_price("cost price", changes.cost_price)?;
        validate_price("sale price", changes.sale_price)?;
        validate_stock_level("min stock", changes.min_stock)?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                category_id = ?4,
                supplier_id = ?5,
                cost_price_cents = ?6,
                sale_price_cents = ?7,
                min_stock = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(changes.name.trim())
        .bind(clean_opt(&changes.description))
        .bind(clean_opt(&changes.category_id))
        .bind(clean_opt(&changes.supplier_id))
        .bind(changes.cost_price.cents())
        .bind(changes.sale_price.cents())
        .bind(changes.min_stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product updated");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft delete: the product disappears from searches and cannot be sold,
    /// but its history stays intact.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deactivated");
        Ok(())
    }

    /// Active products at or below their minimum stock, lowest first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        Self::find_low_stock(&self.pool).await
    }

    // -------------------------------------------------------------------------
    // Executor-generic building blocks
    // -------------------------------------------------------------------------

    pub async fn find_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Product>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let product = sqlx::query_as::<_, Product>(&format!("{} WHERE id = ?1", SELECT_PRODUCT))
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(product)
    }

    pub(crate) async fn find_low_stock<'e, E>(executor: E) -> DbResult<Vec<Product>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{} WHERE is_active = 1 AND current_stock <= min_stock \
             ORDER BY current_stock, name",
            SELECT_PRODUCT
        ))
        .fetch_all(executor)
        .await?;

        Ok(products)
    }

    /// Adds `delta` (signed) to a product's stock unless the result would be
    /// negative. Returns `false` when the guard refused the update or the
    /// product does not exist.
    pub(crate) async fn adjust_stock_guarded<'e, E>(
        executor: E,
        id: &str,
        delta: i64,
    ) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET current_stock = current_stock + ?2,
                updated_at = ?3
            WHERE id = ?1 AND current_stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        debug!(id = %id, delta = delta, applied = result.rows_affected() == 1, "Guarded stock update");
        Ok(result.rows_affected() == 1)
    }
}
