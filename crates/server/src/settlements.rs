//! Settlement API endpoints

use api_types::expense::ExpenseCreated;
use api_types::settlement::{
    SettlementNew, SettlementPolicy as ApiPolicy, SettlementProposalResponse, TransferView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    ServerError,
    groups::{acting_member_id, require_membership},
    member,
    server::ServerState,
};
use ledger::{Money, SettlementPolicy};

fn map_policy(policy: Option<ApiPolicy>) -> SettlementPolicy {
    match policy.unwrap_or_default() {
        ApiPolicy::Strict => SettlementPolicy::Strict,
        ApiPolicy::Advisory => SettlementPolicy::Advisory,
    }
}

/// Handle requests for a settlement proposal.
///
/// The proposal is advisory: nothing is recorded until members post the
/// individual transfers.
pub async fn propose(
    Extension(member): Extension<member::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<SettlementProposalResponse>, ServerError> {
    let member_id = acting_member_id(&member)?;
    require_membership(&state, group_id, member_id).await?;

    let transfers = state.ledger.propose_settlement(group_id).await?;
    Ok(Json(SettlementProposalResponse {
        transfers: transfers
            .into_iter()
            .map(|transfer| TransferView {
                debtor_id: transfer.debtor,
                creditor_id: transfer.creditor,
                amount_minor: transfer.amount.minor(),
            })
            .collect(),
    }))
}

/// Handle requests for recording a settlement transfer.
pub async fn record(
    Extension(member): Extension<member::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<SettlementNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let member_id = acting_member_id(&member)?;
    require_membership(&state, group_id, member_id).await?;

    let expense_id = state
        .ledger
        .record_settlement(
            group_id,
            payload.debtor_id,
            payload.creditor_id,
            Money::new(payload.amount_minor),
            map_policy(payload.policy),
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ExpenseCreated { id: expense_id })))
}
