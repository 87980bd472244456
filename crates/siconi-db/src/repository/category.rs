//! # Category Repository
//!
//! Product categories. The standard set is seeded by migration; names are
//! stored uppercased and are unique.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use siconi_core::validation::validate_name;
use siconi_core::{new_id, Category};

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    /// Case-insensitive lookup by name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE name = ?1")
                .bind(name.trim().to_uppercase())
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    pub async fn insert(&self, name: &str) -> DbResult<Category> {
        validate_name("category", name)?;

        let category = Category {
            id: new_id(),
            name: name.trim().to_uppercase(),
        };

        sqlx::query("INSERT INTO categories (id, name) VALUES (?1, ?2)")
            .bind(&category.id)
            .bind(&category.name)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &category.name),
                other => other,
            })?;

        info!(id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }
}
