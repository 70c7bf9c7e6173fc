//! Settlement proposal and validation.
//!
//! A settlement is a transfer from a debtor to a creditor that moves both
//! nets toward zero. Proposals are advisory output only; each transfer the
//! users actually make is recorded individually through the ledger as a
//! `settlement`-kind expense, so it stays visible in history.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{Balance, LedgerError, Money, ResultLedger};

/// A proposed or requested transfer: `debtor` pays `creditor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub debtor: Uuid,
    pub creditor: Uuid,
    pub amount: Money,
}

/// Whether settlement validation rejects or merely logs a transfer that
/// does not match the debtor's outstanding debt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SettlementPolicy {
    /// Reject transfers that exceed the outstanding debt or settle a
    /// debtor who owes nothing.
    #[default]
    Strict,
    /// Accept such transfers, logging a warning.
    Advisory,
}

/// Proposes a minimal set of transfers driving all nets to zero.
///
/// Greedy matching: repeatedly pair the largest debtor with the largest
/// creditor (ties broken by smaller member id) and transfer
/// `min(debt, credit)`. Deterministic for a given balance table.
#[must_use]
pub fn propose_transfers(balances: &BTreeMap<Uuid, Balance>) -> Vec<Transfer> {
    let mut debtors: Vec<(Uuid, i64)> = Vec::new();
    let mut creditors: Vec<(Uuid, i64)> = Vec::new();
    for (member_id, balance) in balances {
        let net = balance.net().minor();
        if net < 0 {
            debtors.push((*member_id, -net));
        } else if net > 0 {
            creditors.push((*member_id, net));
        }
    }

    let mut transfers = Vec::new();
    while !debtors.is_empty() && !creditors.is_empty() {
        let debtor_idx = largest(&debtors);
        let creditor_idx = largest(&creditors);
        let amount = debtors[debtor_idx].1.min(creditors[creditor_idx].1);

        transfers.push(Transfer {
            debtor: debtors[debtor_idx].0,
            creditor: creditors[creditor_idx].0,
            amount: Money::new(amount),
        });

        debtors[debtor_idx].1 -= amount;
        creditors[creditor_idx].1 -= amount;
        debtors.retain(|(_, outstanding)| *outstanding > 0);
        creditors.retain(|(_, outstanding)| *outstanding > 0);
    }

    transfers
}

/// Index of the entry with the largest outstanding amount; ties go to the
/// smaller member id.
fn largest(entries: &[(Uuid, i64)]) -> usize {
    let mut best = 0;
    for (idx, entry) in entries.iter().enumerate().skip(1) {
        let (best_id, best_amount) = entries[best];
        if entry.1 > best_amount || (entry.1 == best_amount && entry.0 < best_id) {
            best = idx;
        }
    }
    best
}

/// Validates a user-specified transfer against the group's current
/// balances.
///
/// Always rejects non-positive amounts and self-transfers. Under
/// [`SettlementPolicy::Strict`], also rejects transfers where the debtor
/// owes nothing or the amount exceeds the outstanding debt (zero
/// tolerance: amounts are integer minor units). Under
/// [`SettlementPolicy::Advisory`] those two conditions only log a warning.
pub fn validate_transfer(
    balances: &BTreeMap<Uuid, Balance>,
    transfer: Transfer,
    policy: SettlementPolicy,
) -> ResultLedger<()> {
    if !transfer.amount.is_positive() {
        return Err(LedgerError::InvalidAmount(format!(
            "settlement amount must be > 0, got {}",
            transfer.amount
        )));
    }
    if transfer.debtor == transfer.creditor {
        return Err(LedgerError::InvalidSettlement(
            "debtor and creditor must differ".to_string(),
        ));
    }

    let net = balances
        .get(&transfer.debtor)
        .map(Balance::net)
        .unwrap_or(Money::ZERO);

    let issue = if !net.is_negative() {
        Some(format!(
            "member {} has no outstanding debt (net {net})",
            transfer.debtor
        ))
    } else if transfer.amount > -net {
        Some(format!(
            "settlement of {} exceeds outstanding debt of {}",
            transfer.amount,
            -net
        ))
    } else {
        None
    };

    if let Some(message) = issue {
        match policy {
            SettlementPolicy::Strict => return Err(LedgerError::InvalidSettlement(message)),
            SettlementPolicy::Advisory => {
                tracing::warn!("accepting settlement anyway: {message}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(n: u8) -> Uuid {
        Uuid::from_u128(n as u128)
    }

    fn balances(nets: &[(Uuid, i64)]) -> BTreeMap<Uuid, Balance> {
        nets.iter()
            .map(|(member_id, net)| {
                let balance = if *net >= 0 {
                    Balance {
                        total_paid: Money::new(*net),
                        total_owed: Money::ZERO,
                    }
                } else {
                    Balance {
                        total_paid: Money::ZERO,
                        total_owed: Money::new(-net),
                    }
                };
                (*member_id, balance)
            })
            .collect()
    }

    fn apply(balances: &mut BTreeMap<Uuid, Balance>, transfers: &[Transfer]) {
        for transfer in transfers {
            balances.get_mut(&transfer.debtor).unwrap().total_paid += transfer.amount;
            balances.get_mut(&transfer.creditor).unwrap().total_owed += transfer.amount;
        }
    }

    #[test]
    fn proposal_drives_all_nets_to_zero() {
        let mut table = balances(&[
            (member(1), 6000),
            (member(2), -3000),
            (member(3), -3000),
        ]);
        let transfers = propose_transfers(&table);
        assert_eq!(transfers.len(), 2);

        apply(&mut table, &transfers);
        assert!(table.values().all(|b| b.net().is_zero()));
    }

    #[test]
    fn proposal_matches_largest_debtor_with_largest_creditor() {
        let table = balances(&[
            (member(1), 5000),
            (member(2), 1000),
            (member(3), -4000),
            (member(4), -2000),
        ]);
        let transfers = propose_transfers(&table);
        assert_eq!(
            transfers,
            vec![
                Transfer {
                    debtor: member(3),
                    creditor: member(1),
                    amount: Money::new(4000),
                },
                Transfer {
                    debtor: member(4),
                    creditor: member(1),
                    amount: Money::new(1000),
                },
                Transfer {
                    debtor: member(4),
                    creditor: member(2),
                    amount: Money::new(1000),
                },
            ]
        );
    }

    #[test]
    fn proposal_breaks_ties_by_member_id() {
        let table = balances(&[
            (member(1), -1000),
            (member(2), -1000),
            (member(3), 2000),
        ]);
        let transfers = propose_transfers(&table);
        assert_eq!(transfers[0].debtor, member(1));
        assert_eq!(transfers[1].debtor, member(2));
    }

    #[test]
    fn proposal_of_settled_group_is_empty() {
        let table = balances(&[(member(1), 0), (member(2), 0)]);
        assert!(propose_transfers(&table).is_empty());
    }

    #[test]
    fn strict_policy_rejects_overshoot() {
        let table = balances(&[(member(1), -1000), (member(2), 1000)]);
        let transfer = Transfer {
            debtor: member(1),
            creditor: member(2),
            amount: Money::new(1001),
        };
        let err = validate_transfer(&table, transfer, SettlementPolicy::Strict).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidSettlement(_)));
        assert!(validate_transfer(&table, transfer, SettlementPolicy::Advisory).is_ok());
    }

    #[test]
    fn strict_policy_rejects_debtor_without_debt() {
        let table = balances(&[(member(1), 500), (member(2), -500)]);
        let transfer = Transfer {
            debtor: member(1),
            creditor: member(2),
            amount: Money::new(500),
        };
        let err = validate_transfer(&table, transfer, SettlementPolicy::Strict).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidSettlement(_)));
    }

    #[test]
    fn exact_settlement_is_accepted() {
        let table = balances(&[(member(1), -1000), (member(2), 1000)]);
        let transfer = Transfer {
            debtor: member(1),
            creditor: member(2),
            amount: Money::new(1000),
        };
        assert!(validate_transfer(&table, transfer, SettlementPolicy::Strict).is_ok());
    }

    #[test]
    fn self_transfers_are_rejected() {
        let table = balances(&[(member(1), -1000), (member(2), 1000)]);
        let transfer = Transfer {
            debtor: member(1),
            creditor: member(1),
            amount: Money::new(100),
        };
        let err = validate_transfer(&table, transfer, SettlementPolicy::Advisory).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidSettlement(_)));
    }
}
