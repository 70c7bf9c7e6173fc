//! Expense API endpoints

use api_types::expense::{
    ExpenseCreated, ExpenseKind as ApiKind, ExpenseListQuery, ExpenseListResponse, ExpenseNew,
    ExpenseView, SplitRule as ApiSplitRule, SplitView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
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
use ledger::{Expense, ExpenseKind, Money, PercentShare, RatioShare, SplitRule};

fn map_kind(kind: ExpenseKind) -> ApiKind {
    match kind {
        ExpenseKind::Regular => ApiKind::Regular,
        ExpenseKind::Settlement => ApiKind::Settlement,
    }
}

fn map_currency(currency: ledger::Currency) -> api_types::Currency {
    match currency {
        ledger::Currency::Usd => api_types::Currency::Usd,
    }
}

fn map_rule(rule: ApiSplitRule) -> SplitRule {
    match rule {
        ApiSplitRule::Equal { members } => SplitRule::Equal {
            members: members.into_iter().collect(),
        },
        ApiSplitRule::Ratio { entries } => SplitRule::Ratio {
            entries: entries
                .into_iter()
                .map(|entry| RatioShare {
                    member_id: entry.member_id,
                    numerator: entry.numerator,
                    denominator: entry.denominator,
                })
                .collect(),
        },
        ApiSplitRule::Percentage { entries } => SplitRule::Percentage {
            entries: entries
                .into_iter()
                .map(|entry| PercentShare {
                    member_id: entry.member_id,
                    percent: entry.percent,
                })
                .collect(),
        },
        ApiSplitRule::Exact { entries } => SplitRule::Exact {
            entries: entries
                .into_iter()
                .map(|entry| (entry.member_id, Money::new(entry.amount_minor)))
                .collect(),
        },
        ApiSplitRule::Lend { to } => SplitRule::Lend { to },
    }
}

pub(crate) fn expense_view(expense: Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        group_id: expense.group_id,
        kind: map_kind(expense.kind),
        description: expense.description,
        amount_minor: expense.amount.minor(),
        currency: map_currency(expense.currency),
        payer_id: expense.payer_id,
        source_text: expense.source_text,
        created_at: expense.created_at.fixed_offset(),
        splits: expense
            .splits
            .iter()
            .map(|split| SplitView {
                member_id: split.member_id,
                amount_minor: split.amount.minor(),
            })
            .collect(),
    }
}

/// Handle requests for recording a structured expense.
pub async fn record(
    Extension(member): Extension<member::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let member_id = acting_member_id(&member)?;
    require_membership(&state, group_id, member_id).await?;

    let rule = map_rule(payload.rule);
    let expense_id = state
        .ledger
        .record_expense(
            group_id,
            payload.payer_id,
            Money::new(payload.amount_minor),
            &payload.description,
            &rule,
            payload.source_text.as_deref(),
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ExpenseCreated { id: expense_id })))
}

/// Handle requests for listing a group's expenses (newest first).
pub async fn list(
    Extension(member): Extension<member::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let member_id = acting_member_id(&member)?;
    require_membership(&state, group_id, member_id).await?;

    let limit = query.limit.unwrap_or(50);
    let page = state
        .ledger
        .list_group_expenses(group_id, limit, query.cursor.as_deref())
        .await?;

    Ok(Json(ExpenseListResponse {
        expenses: page.expenses.into_iter().map(expense_view).collect(),
        next_cursor: page.next_cursor,
    }))
}

/// Handle requests for one expense with its splits.
pub async fn get_detail(
    Extension(member): Extension<member::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    let member_id = acting_member_id(&member)?;
    let expense = state.ledger.expense_with_splits(expense_id).await?;
    require_membership(&state, expense.group_id, member_id).await?;

    Ok(Json(expense_view(expense)))
}
