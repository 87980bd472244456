//! `siconi user ...`

use clap::Subcommand;
use serde_json::{json, Value};
use siconi_core::UserRole;

use super::{to_json, Context};
use crate::error::CliResult;

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a back office account
    Add {
        username: String,
        #[arg(long)]
        full_name: String,
        /// ADMIN, VENDEDOR or ASISTENTE
        #[arg(long, default_value = "vendedor")]
        role: UserRole,
        #[arg(long)]
        password: String,
    },
    /// Check a username/password pair
    Verify {
        username: String,
        #[arg(long)]
        password: String,
    },
    List,
}

pub async fn run(ctx: &Context, action: UserAction) -> CliResult<Value> {
    let users = ctx.db.users();

    match action {
        UserAction::Add {
            username,
            full_name,
            role,
            password,
        } => to_json(&users.create(&username, &password, &full_name, role).await?),
        UserAction::Verify { username, password } => {
            let user = users.verify_credentials(&username, &password).await?;
            Ok(json!({ "valid": user.is_some(), "user": user }))
        }
        UserAction::List => to_json(&users.list().await?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;

    #[tokio::test]
    async fn test_add_and_verify_without_leaking_hash() {
        let ctx = testing::context().await;

        let created = run(
            &ctx,
            UserAction::Add {
                username: "Marina".to_string(),
                full_name: "Marina Salas".to_string(),
                role: UserRole::Admin,
                password: "costura123".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(created["username"], "marina");
        assert!(created.get("password_hash").is_none());

        let ok = run(
            &ctx,
            UserAction::Verify {
                username: "marina".to_string(),
                password: "costura123".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(ok["valid"], true);

        let bad = run(
            &ctx,
            UserAction::Verify {
                username: "marina".to_string(),
                password: "incorrecta".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(bad["valid"], false);
    }
}
