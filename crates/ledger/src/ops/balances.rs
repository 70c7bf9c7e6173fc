use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{Balance, ResultLedger, balance};

use super::Ledger;

impl Ledger {
    /// Computes every member's paid/owed/net standing within a group.
    ///
    /// Balances are derived fresh from the group's committed expense
    /// history; nothing is cached or stored, so two calls without
    /// intervening writes return identical results and the nets always sum
    /// to zero.
    pub async fn group_breakdown(&self, group_id: Uuid) -> ResultLedger<BTreeMap<Uuid, Balance>> {
        let group = self.group(group_id).await?;
        let expenses = self.load_group_expenses_with_splits(group_id).await?;
        Ok(balance::aggregate(&group.members, &expenses))
    }

    /// Computes the member's standing in each group they belong to.
    pub async fn member_breakdown(
        &self,
        member_id: Uuid,
    ) -> ResultLedger<Vec<(Uuid, Balance)>> {
        let groups = self.member_groups(member_id).await?;

        let mut breakdowns = Vec::with_capacity(groups.len());
        for group in groups {
            let balances = self.group_breakdown(group.id).await?;
            let balance = balances.get(&member_id).copied().unwrap_or_default();
            breakdowns.push((group.id, balance));
        }
        Ok(breakdowns)
    }
}
