//! # Club Repository
//!
//! Swim clubs clients can belong to. Seeded by migration like categories.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use siconi_core::validation::validate_name;
use siconi_core::{new_id, Club};

#[derive(Debug, Clone)]
pub struct ClubRepository {
    pool: SqlitePool,
}

impl ClubRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClubRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Club>> {
        let clubs = sqlx::query_as::<_, Club>("SELECT id, name FROM clubs ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(clubs)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Club>> {
        let club = sqlx::query_as::<_, Club>("SELECT id, name FROM clubs WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(club)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Club>> {
        let club = sqlx::query_as::<_, Club>("SELECT id, name FROM clubs WHERE name = ?1")
            .bind(name.trim().to_uppercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(club)
    }

    pub async fn insert(&self, name: &str) -> DbResult<Club> {
        validate_name("club", name)?;

        let club = Club {
            id: new_id(),
            name: name.trim().to_uppercase(),
        };

        sqlx::query("INSERT INTO clubs (id, name) VALUES (?1, ?2)")
            .bind(&club.id)
            .bind(&club.name)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &club.name),
                other => other,
            })?;

        info!(id = %club.id, name = %club.name, "Club created");
        Ok(club)
    }
}
