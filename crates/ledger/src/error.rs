//! The module contains the errors the ledger can throw.
//!
//! Validation errors (`UnknownMember`, `InvalidAmount`, `SplitMismatch`,
//! `EmptyPlan`, `InvalidSettlement`) are raised before any write is
//! attempted, so a rejected operation never leaves partial state behind.
//! Persistence failures abort the current atomic operation and surface as
//! [`ReadFailed`]/[`WriteFailed`]; the ledger never retries them.
//!
//! [`ReadFailed`]: LedgerError::ReadFailed
//! [`WriteFailed`]: LedgerError::WriteFailed

use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Unknown member: {0}")]
    UnknownMember(String),
    #[error("Member not found: {0}")]
    MemberNotFound(String),
    #[error("Group not found: {0}")]
    GroupNotFound(String),
    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Split mismatch: {0}")]
    SplitMismatch(String),
    #[error("Empty plan: the splitting rule resolved to no participants")]
    EmptyPlan,
    #[error("Invalid settlement: {0}")]
    InvalidSettlement(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("ledger read failed: {0}")]
    ReadFailed(#[source] DbErr),
    #[error("ledger write failed: {0}")]
    WriteFailed(#[source] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::UnknownMember(a), Self::UnknownMember(b)) => a == b,
            (Self::MemberNotFound(a), Self::MemberNotFound(b)) => a == b,
            (Self::GroupNotFound(a), Self::GroupNotFound(b)) => a == b,
            (Self::ExpenseNotFound(a), Self::ExpenseNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::SplitMismatch(a), Self::SplitMismatch(b)) => a == b,
            (Self::EmptyPlan, Self::EmptyPlan) => true,
            (Self::InvalidSettlement(a), Self::InvalidSettlement(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::ReadFailed(a), Self::ReadFailed(b)) => a.to_string() == b.to_string(),
            (Self::WriteFailed(a), Self::WriteFailed(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
