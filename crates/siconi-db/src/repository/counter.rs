//! # Counters
//!
//! Backing values of the sequential codes (`PED-0001`, invoice and control
//! numbers). Incrementing is a single statement, so two writers can never
//! read the same value; run it inside the transaction that uses the code and
//! a rollback gives the number back.

use sqlx::{Executor, Sqlite};
use tracing::debug;

use crate::error::DbResult;
use siconi_core::codes::CodeKind;

/// Increments the counter of `kind` and returns the new value.
pub async fn next_value<'e, E>(executor: E, kind: CodeKind) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO counters (name, value) VALUES (?1, 1)
        ON CONFLICT(name) DO UPDATE SET value = value + 1
        RETURNING value
        "#,
    )
    .bind(kind.counter_name())
    .fetch_one(executor)
    .await?;

    debug!(counter = %kind, value = value, "Counter advanced");
    Ok(value)
}

/// Current value without advancing it (0 if never used).
pub async fn current_value<'e, E>(executor: E, kind: CodeKind) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let value: Option<i64> = sqlx::query_scalar("SELECT value FROM counters WHERE name = ?1")
        .bind(kind.counter_name())
        .fetch_optional(executor)
        .await?;

    Ok(value.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_counters_are_independent_and_sequential() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let pool = db.pool();

        assert_eq!(next_value(pool, CodeKind::Order).await.unwrap(), 1);
        assert_eq!(next_value(pool, CodeKind::Order).await.unwrap(), 2);
        assert_eq!(next_value(pool, CodeKind::Invoice).await.unwrap(), 1);
        assert_eq!(current_value(pool, CodeKind::Order).await.unwrap(), 2);
        assert_eq!(current_value(pool, CodeKind::Control).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rollback_returns_the_number() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(next_value(&mut *tx, CodeKind::Order).await.unwrap(), 1);
        tx.rollback().await.unwrap();

        assert_eq!(next_value(db.pool(), CodeKind::Order).await.unwrap(), 1);
    }
}
