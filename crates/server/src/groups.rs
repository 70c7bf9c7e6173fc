//! Group API endpoints

use api_types::group::{GroupMemberAdd, GroupNew, GroupView};
use api_types::member::MemberView;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, member, server::ServerState};
use ledger::{Group, LedgerError};

pub(crate) fn acting_member_id(member: &member::Model) -> Result<Uuid, ServerError> {
    Uuid::parse_str(&member.id)
        .map_err(|_| ServerError::Generic("invalid member id".to_string()))
}

/// Loads a group and checks the acting member belongs to it. Groups the
/// caller is not part of look exactly like missing groups.
pub(crate) async fn require_membership(
    state: &ServerState,
    group_id: Uuid,
    member_id: Uuid,
) -> Result<Group, ServerError> {
    let group = state.ledger.group(group_id).await?;
    if !group.contains(member_id) {
        return Err(ServerError::Ledger(LedgerError::GroupNotFound(
            group_id.to_string(),
        )));
    }
    Ok(group)
}

async fn group_view(state: &ServerState, group: &Group) -> Result<GroupView, ServerError> {
    let roster = state.ledger.group_members(group.id).await?;
    Ok(GroupView {
        id: group.id,
        name: group.name.clone(),
        members: roster
            .into_iter()
            .map(|member| MemberView {
                id: member.id,
                name: member.name,
            })
            .collect(),
    })
}

/// Handle requests for creating a new group.
///
/// The acting member is always included in the member set.
pub async fn create(
    Extension(member): Extension<member::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<GroupView>), ServerError> {
    let mut member_ids = payload.member_ids;
    member_ids.push(acting_member_id(&member)?);

    let group = state.ledger.create_group(&payload.name, &member_ids).await?;
    let view = group_view(&state, &group).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Handle requests for fetching a group with its roster.
pub async fn get(
    Extension(member): Extension<member::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GroupView>, ServerError> {
    let member_id = acting_member_id(&member)?;
    let group = require_membership(&state, group_id, member_id).await?;
    Ok(Json(group_view(&state, &group).await?))
}

/// Handle requests for adding a member to a group.
pub async fn add_member(
    Extension(member): Extension<member::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<GroupMemberAdd>,
) -> Result<StatusCode, ServerError> {
    let member_id = acting_member_id(&member)?;
    require_membership(&state, group_id, member_id).await?;

    state
        .ledger
        .add_group_member(group_id, payload.member_id)
        .await?;
    Ok(StatusCode::CREATED)
}
