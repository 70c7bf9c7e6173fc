//! Free-text expense entry.
//!
//! The chat endpoint hands the message to the interpreter, resolves the
//! candidate's member names against the group roster, and lets the ledger
//! re-validate the claimed amounts before recording. Interpreter failures
//! and arithmetic mismatches come back as a structured reply, never as a
//! recorded expense.

use api_types::chat::{ChatMessageNew, ChatReply};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    ServerError,
    groups::{acting_member_id, require_membership},
    interpreter::{CandidateExpense, candidate_amount},
    member,
    server::ServerState,
};
use ledger::{Member, SplitCandidate};

enum CandidateError {
    /// The candidate was unusable; tell the author why, record nothing.
    Reply(String),
    Server(ServerError),
}

impl From<ServerError> for CandidateError {
    fn from(value: ServerError) -> Self {
        Self::Server(value)
    }
}

fn reply_failure(message: &str) -> ChatReply {
    ChatReply {
        recorded: false,
        message: message.to_string(),
        expense_id: None,
    }
}

/// Handle free-text expense messages for a group.
pub async fn send(
    Extension(member): Extension<member::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<ChatMessageNew>,
) -> Result<Json<ChatReply>, ServerError> {
    let member_id = acting_member_id(&member)?;
    require_membership(&state, group_id, member_id).await?;

    let Some(interpreter) = state.interpreter.clone() else {
        return Ok(Json(reply_failure(
            "Natural-language entry is not configured; use the structured expense endpoint instead.",
        )));
    };

    let roster = state.ledger.group_members(group_id).await?;
    let names: Vec<String> = roster.iter().map(|m| m.name.clone()).collect();

    let candidate = match interpreter.parse_expense(&payload.message, &names).await {
        Ok(Some(candidate)) => candidate,
        Ok(None) => {
            return Ok(Json(reply_failure(
                "I couldn't understand that as an expense. Try something like \
                 'I paid $25 for pizza, split equally among everyone'.",
            )));
        }
        Err(err) => {
            tracing::warn!("interpreter request failed: {err}");
            return Ok(Json(reply_failure(
                "The expense interpreter is currently unavailable.",
            )));
        }
    };

    match record_candidate(
        &state,
        group_id,
        member_id,
        &roster,
        candidate,
        &payload.message,
    )
    .await
    {
        Ok((expense_id, message)) => Ok(Json(ChatReply {
            recorded: true,
            message,
            expense_id: Some(expense_id),
        })),
        Err(CandidateError::Reply(message)) => Ok(Json(reply_failure(&message))),
        Err(CandidateError::Server(err)) => Err(err),
    }
}

async fn record_candidate(
    state: &ServerState,
    group_id: Uuid,
    acting_member_id: Uuid,
    roster: &[Member],
    candidate: CandidateExpense,
    source_text: &str,
) -> Result<(Uuid, String), CandidateError> {
    let payer = resolve_member(&candidate.paid_by, acting_member_id, roster).ok_or_else(|| {
        CandidateError::Reply(format!(
            "I couldn't find the member '{}' in this group.",
            candidate.paid_by
        ))
    })?;

    let total = candidate_amount(&candidate.amount).ok_or_else(|| {
        CandidateError::Reply(format!("'{}' is not a usable amount.", candidate.amount))
    })?;

    let mut entries = Vec::with_capacity(candidate.splits.len());
    for split in &candidate.splits {
        let who = resolve_member(&split.user, acting_member_id, roster).ok_or_else(|| {
            CandidateError::Reply(format!(
                "I couldn't find the member '{}' in this group.",
                split.user
            ))
        })?;
        let amount = candidate_amount(&split.amount).ok_or_else(|| {
            CandidateError::Reply(format!("'{}' is not a usable amount.", split.amount))
        })?;
        entries.push((who.id, amount));
    }

    let split_candidate = SplitCandidate {
        description: candidate.description.clone(),
        total,
        payer_id: payer.id,
        entries,
    };
    // The trust boundary: the interpreter's arithmetic is checked here, and
    // a mismatch bounces back to the author instead of being recorded.
    let rule = split_candidate
        .into_rule()
        .map_err(|err| CandidateError::Reply(err.to_string()))?;

    let expense_id = state
        .ledger
        .record_expense(
            group_id,
            payer.id,
            total,
            &candidate.description,
            &rule,
            Some(source_text),
            Utc::now(),
        )
        .await
        .map_err(|err| CandidateError::Server(err.into()))?;

    let message = format!(
        "Added expense: {} - {} paid by {}",
        candidate.description, total, payer.name
    );
    Ok((expense_id, message))
}

/// Resolves an interpreter-supplied name to a group member. "me"/"I" mean
/// the message author; everything else is matched case-insensitively
/// against the roster.
fn resolve_member<'a>(
    name: &str,
    acting_member_id: Uuid,
    roster: &'a [Member],
) -> Option<&'a Member> {
    let trimmed = name.trim();
    if trimmed.eq_ignore_ascii_case("me") || trimmed.eq_ignore_ascii_case("i") {
        roster.iter().find(|member| member.id == acting_member_id)
    } else {
        roster
            .iter()
            .find(|member| member.name.eq_ignore_ascii_case(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Member> {
        vec![
            Member {
                id: Uuid::from_u128(1),
                name: "Alice".to_string(),
            },
            Member {
                id: Uuid::from_u128(2),
                name: "Bob".to_string(),
            },
        ]
    }

    #[test]
    fn me_resolves_to_the_author() {
        let roster = roster();
        let me = resolve_member("me", Uuid::from_u128(2), &roster).unwrap();
        assert_eq!(me.name, "Bob");
        let me = resolve_member("I", Uuid::from_u128(1), &roster).unwrap();
        assert_eq!(me.name, "Alice");
    }

    #[test]
    fn names_match_case_insensitively() {
        let roster = roster();
        let member = resolve_member(" alice ", Uuid::from_u128(2), &roster).unwrap();
        assert_eq!(member.id, Uuid::from_u128(1));
        assert!(resolve_member("Mallory", Uuid::from_u128(2), &roster).is_none());
    }
}
