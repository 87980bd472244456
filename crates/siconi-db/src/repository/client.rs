//! # Client Repository
//!
//! Clients are referenced from sales by their UUID `id`, the same string
//! type used for every other relation.

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{clean_opt, like_pattern};
use siconi_core::validation::{validate_name, validate_search_query};
use siconi_core::{new_id, Client, CoreError, NewClient};

const SELECT_CLIENT: &str = r#"
    SELECT id, name, document_id, phone, email, address, club_id, is_vip, created_at
    FROM clients
"#;

#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    pub async fn insert(&self, input: &NewClient) -> DbResult<Client> {
        validate_name("name", &input.name)?;

        let client = Client {
            id: new_id(),
            name: input.name.trim().to_string(),
            document_id: clean_opt(&input.document_id).map(|s| s.to_uppercase()),
            phone: clean_opt(&input.phone),
            email: clean_opt(&input.email),
            address: clean_opt(&input.address),
            club_id: clean_opt(&input.club_id),
            is_vip: input.is_vip,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, name, document_id, phone, email, address, club_id, is_vip, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.document_id)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.address)
        .bind(&client.club_id)
        .bind(client.is_vip)
        .bind(client.created_at)
        .execute(&self.pool)
        .await?;

        info!(id = %client.id, name = %client.name, vip = client.is_vip, "Client created");
        Ok(client)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        Self::find_by_id(&self.pool, id).await
    }

    /// Like [`Self::get_by_id`] but a missing client is an error.
    pub async fn require(&self, id: &str) -> DbResult<Client> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::Domain(CoreError::ClientNotFound(id.to_string())))
    }

    /// Clients by name or document; all clients for an empty query.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Client>> {
        let query = validate_search_query(query)?;
        debug!(query = %query, "Searching clients");

        let clients = sqlx::query_as::<_, Client>(&format!(
            "{} WHERE ?1 = '' OR name LIKE ?2 ESCAPE '\\' OR document_id LIKE ?2 ESCAPE '\\' \
             ORDER BY name LIMIT ?3",
            SELECT_CLIENT
        ))
        .bind(&query)
        .bind(like_pattern(&query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    pub async fn list_by_club(&self, club_id: &str) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "{} WHERE club_id = ?1 ORDER BY name",
            SELECT_CLIENT
        ))
        .bind(club_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    pub async fn set_vip(&self, id: &str, is_vip: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE clients SET is_vip = ?2 WHERE id = ?1")
            .bind(id)
            .bind(is_vip)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ClientNotFound(id.to_string()).into());
        }

        info!(id = %id, vip = is_vip, "Client VIP flag changed");
        Ok(())
    }

    pub(crate) async fn find_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Client>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let client = sqlx::query_as::<_, Client>(&format!("{} WHERE id = ?1", SELECT_CLIENT))
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_with_club_and_vip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let club = db.clubs().get_by_name("SIN CLUB").await.unwrap().unwrap();

        let client = db
            .clients()
            .insert(&NewClient {
                name: "Ana Pérez".to_string(),
                document_id: Some("v-20111222".to_string()),
                club_id: Some(club.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(client.document_id.as_deref(), Some("V-20111222"));
        assert!(!client.is_vip);

        db.clients().set_vip(&client.id, true).await.unwrap();
        assert!(db.clients().require(&client.id).await.unwrap().is_vip);
        assert_eq!(db.clients().list_by_club(&club.id).await.unwrap().len(), 1);
        assert_eq!(db.clients().search("v-2011", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_club_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .clients()
            .insert(&NewClient {
                name: "Luis".to_string(),
                club_id: Some(new_id()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_missing_client() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.clients().require("nope").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ClientNotFound(_))));
        assert!(db.clients().set_vip("nope", true).await.is_err());
    }
}
