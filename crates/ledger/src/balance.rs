//! Balance aggregation.
//!
//! Balances are derived fresh from the expense/split history on every call
//! and never persisted, so they cannot drift from the ledger. Aggregation
//! is a pure fold over expenses: paying adds to `total_paid`, each split
//! adds to its member's `total_owed`. For any group the nets sum to exactly
//! zero, since every minor unit paid is owed by someone.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::{Money, expenses::Expense};

/// A member's standing within one group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Balance {
    /// Sum of expense amounts where the member is the payer.
    pub total_paid: Money,
    /// Sum of the member's split amounts across the group's expenses.
    pub total_owed: Money,
}

impl Balance {
    /// Positive means the member is owed money, negative means they owe.
    #[must_use]
    pub fn net(&self) -> Money {
        self.total_paid - self.total_owed
    }
}

/// Aggregates a group's expenses (with their splits loaded) into per-member
/// balances. Every group member gets an entry, including members with no
/// activity.
#[must_use]
pub fn aggregate(members: &BTreeSet<Uuid>, expenses: &[Expense]) -> BTreeMap<Uuid, Balance> {
    let mut balances: BTreeMap<Uuid, Balance> = members
        .iter()
        .map(|member_id| (*member_id, Balance::default()))
        .collect();

    for expense in expenses {
        balances.entry(expense.payer_id).or_default().total_paid += expense.amount;
        for split in &expense.splits {
            balances.entry(split.member_id).or_default().total_owed += split.amount;
        }
    }

    balances
}
