use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    Currency, LedgerError, Money, ResultLedger, SplitRule,
    expenses::{Expense, ExpenseKind},
    settlement::{self, SettlementPolicy, Transfer},
};

use super::Ledger;

impl Ledger {
    /// Proposes a minimal set of transfers that would settle the group.
    ///
    /// Advisory output only: nothing is recorded. Transfers the members
    /// actually make go through [`Ledger::record_settlement`] one by one.
    pub async fn propose_settlement(&self, group_id: Uuid) -> ResultLedger<Vec<Transfer>> {
        let balances = self.group_breakdown(group_id).await?;
        Ok(settlement::propose_transfers(&balances))
    }

    /// Records a settlement transfer from `debtor_id` to `creditor_id`.
    ///
    /// The transfer is validated against the group's current balances per
    /// `policy`, then stored as a `settlement`-kind expense: the debtor is
    /// the payer and the creditor owes the single split. Settlements stay
    /// visible in the expense history like any other entry.
    pub async fn record_settlement(
        &self,
        group_id: Uuid,
        debtor_id: Uuid,
        creditor_id: Uuid,
        amount: Money,
        policy: SettlementPolicy,
        created_at: DateTime<Utc>,
    ) -> ResultLedger<Uuid> {
        let group = self.group(group_id).await?;
        for member_id in [debtor_id, creditor_id] {
            if !group.contains(member_id) {
                return Err(LedgerError::UnknownMember(member_id.to_string()));
            }
        }

        let balances = self.group_breakdown(group_id).await?;
        let transfer = Transfer {
            debtor: debtor_id,
            creditor: creditor_id,
            amount,
        };
        settlement::validate_transfer(&balances, transfer, policy)?;

        let plan = SplitRule::Lend { to: creditor_id }.resolve(amount, &group.members)?;
        let expense = Expense::new(
            group_id,
            ExpenseKind::Settlement,
            "settle up".to_string(),
            amount,
            Currency::default(),
            debtor_id,
            None,
            created_at,
        )?;

        self.persist_expense(expense, plan).await
    }
}
