//! `siconi client ...`

use clap::Subcommand;
use serde_json::Value;
use siconi_core::NewClient;

use super::{to_json, Context};
use crate::error::{CliError, CliResult};

#[derive(Subcommand)]
pub enum ClientAction {
    Add {
        name: String,
        /// Cédula or RIF
        #[arg(long)]
        document: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// Club name, e.g. "CLUB DE NATACIÓN"
        #[arg(long)]
        club: Option<String>,
        #[arg(long)]
        vip: bool,
    },
    List {
        #[arg(long)]
        search: Option<String>,
        /// Only members of this club
        #[arg(long)]
        club: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

pub async fn run(ctx: &Context, action: ClientAction) -> CliResult<Value> {
    match action {
        ClientAction::Add {
            name,
            document,
            phone,
            email,
            address,
            club,
            vip,
        } => {
            let club_id = match club {
                Some(club) => Some(club_id(ctx, &club).await?),
                None => None,
            };
            let client = ctx
                .db
                .clients()
                .insert(&NewClient {
                    name,
                    document_id: document,
                    phone,
                    email,
                    address,
                    club_id,
                    is_vip: vip,
                })
                .await?;
            to_json(&client)
        }
        ClientAction::List {
            search,
            club,
            limit,
        } => {
            let clients = match club {
                Some(club) => {
                    let id = club_id(ctx, &club).await?;
                    ctx.db.clients().list_by_club(&id).await?
                }
                None => {
                    ctx.db
                        .clients()
                        .search(search.as_deref().unwrap_or(""), limit)
                        .await?
                }
            };
            to_json(&clients)
        }
    }
}

async fn club_id(ctx: &Context, name: &str) -> CliResult<String> {
    ctx.db
        .clubs()
        .get_by_name(name)
        .await?
        .map(|c| c.id)
        .ok_or_else(|| CliError::not_found("Club", name))
}
