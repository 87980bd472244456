//! # Supplier Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{clean_opt, like_pattern};
use siconi_core::validation::{validate_name, validate_search_query};
use siconi_core::{new_id, NewSupplier, Supplier};

const SELECT_SUPPLIER: &str =
    "SELECT id, name, tax_id, phone, email, address, created_at FROM suppliers";

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn insert(&self, input: &NewSupplier) -> DbResult<Supplier> {
        validate_name("name", &input.name)?;

        let supplier = Supplier {
            id: new_id(),
            name: input.name.trim().to_string(),
            tax_id: clean_opt(&input.tax_id).map(|s| s.to_uppercase()),
            phone: clean_opt(&input.phone),
            email: clean_opt(&input.email),
            address: clean_opt(&input.address),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, tax_id, phone, email, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.tax_id)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;

        info!(id = %supplier.id, name = %supplier.name, "Supplier created");
        Ok(supplier)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!("{} WHERE id = ?1", SELECT_SUPPLIER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    /// Suppliers whose name or tax id matches; all of them for an empty query.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Supplier>> {
        let query = validate_search_query(query)?;
        debug!(query = %query, "Searching suppliers");

        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "{} WHERE ?1 = '' OR name LIKE ?2 ESCAPE '\\' OR tax_id LIKE ?2 ESCAPE '\\' \
             ORDER BY name LIMIT ?3",
            SELECT_SUPPLIER
        ))
        .bind(&query)
        .bind(like_pattern(&query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Deletes a supplier that no product references.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        info!(id = %id, "Supplier deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use siconi_core::NewProduct;

    #[tokio::test]
    async fn test_insert_search_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.suppliers();

        let supplier = repo
            .insert(&NewSupplier {
                name: "Telas del Centro".to_string(),
                tax_id: Some("j-12345678-9".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(supplier.tax_id.as_deref(), Some("J-12345678-9"));

        assert_eq!(repo.search("telas", 10).await.unwrap().len(), 1);
        assert_eq!(repo.search("J-1234", 10).await.unwrap().len(), 1);
        assert_eq!(repo.search("", 10).await.unwrap().len(), 1);

        repo.delete(&supplier.id).await.unwrap();
        assert!(repo.get_by_id(&supplier.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_referenced_supplier_cannot_be_deleted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let supplier = db
            .suppliers()
            .insert(&NewSupplier {
                name: "Licras SA".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        db.products()
            .insert(&NewProduct {
                code: "BER-001".to_string(),
                name: "Bermuda".to_string(),
                supplier_id: Some(supplier.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();

        let err = db.suppliers().delete(&supplier.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
