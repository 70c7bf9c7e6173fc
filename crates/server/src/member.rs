//! Member registration and the auth-side view of the members table.

use api_types::member::{MemberNew, MemberView};
use axum::{Json, extract::State, http::StatusCode};
use sea_orm::entity::prelude::*;

use crate::{ServerError, server::ServerState};

/// Read-only view of the `members` table used by the auth middleware. The
/// ledger owns the table; the server only resolves credentials against it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub password: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Registers a new member. The only unauthenticated endpoint.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<MemberNew>,
) -> Result<(StatusCode, Json<MemberView>), ServerError> {
    let member = state
        .ledger
        .create_member(&payload.name, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MemberView {
            id: member.id,
            name: member.name,
        }),
    ))
}
