//! Validation of interpreter-proposed splits.
//!
//! The natural-language interpreter is an external, fallible service: its
//! output is data, never authority. A [`SplitCandidate`] carries the
//! amounts the interpreter claims, already resolved to member ids and minor
//! units by the caller; [`SplitCandidate::into_rule`] re-checks the
//! arithmetic — entries must sum to the stated total exactly, with zero
//! tolerance — before a [`SplitRule`] is ever constructed from it.

use uuid::Uuid;

use crate::{LedgerError, Money, ResultLedger, SplitRule};

/// A candidate split proposed by the interpreter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitCandidate {
    pub description: String,
    pub total: Money,
    pub payer_id: Uuid,
    /// `(member, amount owed)` as claimed by the interpreter.
    pub entries: Vec<(Uuid, Money)>,
}

impl SplitCandidate {
    /// Validates the candidate's arithmetic and converts it into an
    /// explicit [`SplitRule::Exact`] plan.
    ///
    /// The interpreter already did its own per-method math (ratios,
    /// percentages, equal shares); the ledger only accepts the resulting
    /// amounts, and only when they sum exactly to the stated total.
    pub fn into_rule(self) -> ResultLedger<SplitRule> {
        if !self.total.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "expense total must be > 0, got {}",
                self.total
            )));
        }
        if self.entries.is_empty() {
            return Err(LedgerError::EmptyPlan);
        }
        let mut sum = Money::ZERO;
        for (_, amount) in &self.entries {
            if amount.is_negative() {
                return Err(LedgerError::InvalidAmount(format!(
                    "split amount must not be negative, got {amount}"
                )));
            }
            sum += *amount;
        }
        if sum != self.total {
            return Err(LedgerError::SplitMismatch(format!(
                "splits summed to {sum} but expense total is {}",
                self.total
            )));
        }
        Ok(SplitRule::Exact {
            entries: self.entries,
        })
    }
}
