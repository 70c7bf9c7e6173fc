//! Balance breakdown API endpoints

use api_types::breakdown::{
    BalanceView, GroupBalanceView, GroupBreakdownResponse, MemberBreakdownResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{
    ServerError,
    groups::{acting_member_id, require_membership},
    member,
    server::ServerState,
};

/// Handle requests for a group's per-member balances.
pub async fn group(
    Extension(member): Extension<member::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GroupBreakdownResponse>, ServerError> {
    let member_id = acting_member_id(&member)?;
    require_membership(&state, group_id, member_id).await?;

    let balances = state.ledger.group_breakdown(group_id).await?;
    Ok(Json(GroupBreakdownResponse {
        group_id,
        balances: balances
            .into_iter()
            .map(|(member_id, balance)| BalanceView {
                member_id,
                paid_minor: balance.total_paid.minor(),
                owed_minor: balance.total_owed.minor(),
                net_minor: balance.net().minor(),
            })
            .collect(),
    }))
}

/// Handle requests for the acting member's balance in each of their groups.
pub async fn member(
    Extension(member): Extension<member::Model>,
    State(state): State<ServerState>,
) -> Result<Json<MemberBreakdownResponse>, ServerError> {
    let member_id = acting_member_id(&member)?;

    let breakdowns = state.ledger.member_breakdown(member_id).await?;
    Ok(Json(MemberBreakdownResponse {
        member_id,
        groups: breakdowns
            .into_iter()
            .map(|(group_id, balance)| GroupBalanceView {
                group_id,
                paid_minor: balance.total_paid.minor(),
                owed_minor: balance.total_owed.minor(),
                net_minor: balance.net().minor(),
            })
            .collect(),
    }))
}
