use axum::{Json, http::StatusCode, response::IntoResponse};
use ledger::LedgerError;

use serde::Serialize;
pub use interpreter::Interpreter;
pub use server::{run, run_with_listener, spawn_with_listener};

mod breakdown;
mod chat;
mod expenses;
mod groups;
mod interpreter;
mod member;
mod server;
mod settlements;

pub mod types {
    pub mod member {
        pub use api_types::member::{MemberNew, MemberView};
    }

    pub mod group {
        pub use api_types::group::{GroupMemberAdd, GroupNew, GroupView};
    }

    pub mod expense {
        pub use api_types::expense::{
            ExpenseCreated, ExpenseListQuery, ExpenseListResponse, ExpenseNew, ExpenseView,
            SplitRule, SplitView,
        };
    }

    pub mod breakdown {
        pub use api_types::breakdown::{
            BalanceView, GroupBreakdownResponse, MemberBreakdownResponse,
        };
    }

    pub mod settlement {
        pub use api_types::settlement::{
            SettlementNew, SettlementProposalResponse, TransferView,
        };
    }

    pub mod chat {
        pub use api_types::chat::{ChatMessageNew, ChatReply};
    }
}

pub enum ServerError {
    Ledger(LedgerError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_ledger_error(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::GroupNotFound(_)
        | LedgerError::MemberNotFound(_)
        | LedgerError::ExpenseNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::ExistingKey(_) => StatusCode::CONFLICT,
        LedgerError::ReadFailed(_) | LedgerError::WriteFailed(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        LedgerError::UnknownMember(_)
        | LedgerError::InvalidAmount(_)
        | LedgerError::SplitMismatch(_)
        | LedgerError::EmptyPlan
        | LedgerError::InvalidSettlement(_)
        | LedgerError::InvalidId(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_ledger_error(err: LedgerError) -> String {
    match err {
        LedgerError::ReadFailed(db_err) | LedgerError::WriteFailed(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Ledger(err) => {
                (status_for_ledger_error(&err), message_for_ledger_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<LedgerError> for ServerError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}
