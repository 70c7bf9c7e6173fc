//! Splitting rules and their resolution into per-member shares.
//!
//! A [`SplitRule`] is the typed description of how an expense total is
//! divided; [`SplitRule::resolve`] turns it into a [`SplitPlan`], the
//! ordered list of `(member, amount)` shares whose sum equals the total
//! exactly. Every rule is validated against the group's member set before
//! any amount is computed, and every rounding decision is deterministic, so
//! two runs over the same input always agree on the allocation.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::{LedgerError, Money, ResultLedger};

/// One ratio entry: the member's share is `total * numerator / denominator`,
/// rounded down to whole minor units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RatioShare {
    pub member_id: Uuid,
    pub numerator: u32,
    pub denominator: u32,
}

/// One percentage entry. Percentages across a rule must sum to exactly 100.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PercentShare {
    pub member_id: Uuid,
    pub percent: u32,
}

/// How an expense total is divided among members.
///
/// One case per splitting method; untyped mappings never travel through the
/// ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplitRule {
    /// Divide evenly among `members`; the remainder goes one minor unit at a
    /// time to the members with the smallest ids.
    Equal { members: BTreeSet<Uuid> },
    /// Divide by rational ratios; leftover minor units are assigned to the
    /// entries in the order given, one unit each.
    Ratio { entries: Vec<RatioShare> },
    /// Divide by percentages summing to exactly 100; rounding as for
    /// [`SplitRule::Ratio`].
    Percentage { entries: Vec<PercentShare> },
    /// Explicit per-member amounts. These were asserted by the caller, so
    /// they must sum exactly to the total; nothing is silently corrected.
    Exact { entries: Vec<(Uuid, Money)> },
    /// Degenerate one-to-one transfer: `to` owes the full amount, the payer
    /// bears none. Models "I lent X to Y" and settlement transfers.
    Lend { to: Uuid },
}

/// One resolved share of an expense.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Share {
    pub member_id: Uuid,
    pub amount: Money,
}

/// The resolved, validated mapping from an expense total to per-member owed
/// amounts. Construction goes through [`SplitRule::resolve`] only, so a plan
/// in hand always satisfies the sum invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitPlan {
    shares: Vec<Share>,
}

impl SplitPlan {
    #[must_use]
    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    /// Sum of all shares; equals the resolved expense total.
    #[must_use]
    pub fn total(&self) -> Money {
        self.shares
            .iter()
            .fold(Money::ZERO, |acc, share| acc + share.amount)
    }
}

impl SplitRule {
    /// Resolves this rule for `total` against a group's member set.
    ///
    /// Errors:
    /// - [`LedgerError::InvalidAmount`] if `total` is not positive, an entry
    ///   amount is negative, a denominator is zero, percentages do not sum
    ///   to 100, or a member appears twice;
    /// - [`LedgerError::UnknownMember`] if a referenced member is not in the
    ///   group;
    /// - [`LedgerError::SplitMismatch`] if explicit amounts (or degenerate
    ///   ratios) do not cover the total;
    /// - [`LedgerError::EmptyPlan`] if the rule names no participants.
    pub fn resolve(&self, total: Money, group_members: &BTreeSet<Uuid>) -> ResultLedger<SplitPlan> {
        if !total.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "expense total must be > 0, got {total}"
            )));
        }

        let shares = match self {
            SplitRule::Equal { members } => {
                if members.is_empty() {
                    return Err(LedgerError::EmptyPlan);
                }
                for member_id in members {
                    ensure_group_member(*member_id, group_members)?;
                }
                let amounts = total.split_even(members.len())?;
                // BTreeSet iterates ascending, so the remainder lands on the
                // members with the smallest ids.
                members
                    .iter()
                    .zip(amounts)
                    .map(|(member_id, amount)| Share {
                        member_id: *member_id,
                        amount,
                    })
                    .collect()
            }
            SplitRule::Ratio { entries } => {
                if entries.is_empty() {
                    return Err(LedgerError::EmptyPlan);
                }
                ensure_distinct(entries.iter().map(|entry| entry.member_id))?;
                let mut shares = Vec::with_capacity(entries.len());
                for entry in entries {
                    ensure_group_member(entry.member_id, group_members)?;
                    shares.push(Share {
                        member_id: entry.member_id,
                        amount: total.ratio_share(entry.numerator, entry.denominator)?,
                    });
                }
                distribute_leftover(total, shares)?
            }
            SplitRule::Percentage { entries } => {
                if entries.is_empty() {
                    return Err(LedgerError::EmptyPlan);
                }
                ensure_distinct(entries.iter().map(|entry| entry.member_id))?;
                let percent_sum: u32 = entries.iter().map(|entry| entry.percent).sum();
                if percent_sum != 100 {
                    return Err(LedgerError::InvalidAmount(format!(
                        "percentages must sum to 100, got {percent_sum}"
                    )));
                }
                let mut shares = Vec::with_capacity(entries.len());
                for entry in entries {
                    ensure_group_member(entry.member_id, group_members)?;
                    shares.push(Share {
                        member_id: entry.member_id,
                        amount: total.ratio_share(entry.percent, 100)?,
                    });
                }
                distribute_leftover(total, shares)?
            }
            SplitRule::Exact { entries } => {
                if entries.is_empty() {
                    return Err(LedgerError::EmptyPlan);
                }
                ensure_distinct(entries.iter().map(|(member_id, _)| *member_id))?;
                let mut sum = Money::ZERO;
                for (member_id, amount) in entries {
                    ensure_group_member(*member_id, group_members)?;
                    if amount.is_negative() {
                        return Err(LedgerError::InvalidAmount(format!(
                            "split amount must not be negative, got {amount}"
                        )));
                    }
                    sum += *amount;
                }
                if sum != total {
                    return Err(LedgerError::SplitMismatch(format!(
                        "splits summed to {sum} but expense total is {total}"
                    )));
                }
                entries
                    .iter()
                    .map(|(member_id, amount)| Share {
                        member_id: *member_id,
                        amount: *amount,
                    })
                    .collect()
            }
            SplitRule::Lend { to } => {
                ensure_group_member(*to, group_members)?;
                vec![Share {
                    member_id: *to,
                    amount: total,
                }]
            }
        };

        let plan = SplitPlan { shares };
        debug_assert_eq!(plan.total(), total);
        Ok(plan)
    }
}

fn ensure_group_member(member_id: Uuid, group_members: &BTreeSet<Uuid>) -> ResultLedger<()> {
    if !group_members.contains(&member_id) {
        return Err(LedgerError::UnknownMember(member_id.to_string()));
    }
    Ok(())
}

fn ensure_distinct(member_ids: impl Iterator<Item = Uuid>) -> ResultLedger<()> {
    let mut seen = BTreeSet::new();
    for member_id in member_ids {
        if !seen.insert(member_id) {
            return Err(LedgerError::InvalidAmount(format!(
                "member {member_id} appears more than once in the split"
            )));
        }
    }
    Ok(())
}

/// Hands out `total - sum(shares)` one minor unit per entry, in the order
/// given. Rounded shares always undershoot, so for ratios/percentages that
/// cover the whole the leftover is strictly smaller than the entry count;
/// anything else means the rule does not cover the total and is rejected.
fn distribute_leftover(total: Money, mut shares: Vec<Share>) -> ResultLedger<Vec<Share>> {
    let sum = shares
        .iter()
        .fold(Money::ZERO, |acc, share| acc + share.amount);
    let leftover = (total - sum).minor();
    if leftover < 0 || leftover as usize >= shares.len() {
        return Err(LedgerError::SplitMismatch(format!(
            "shares summed to {sum} but expense total is {total}"
        )));
    }
    for share in shares.iter_mut().take(leftover as usize) {
        share.amount += Money::new(1);
    }
    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(n: u8) -> Uuid {
        Uuid::from_u128(n as u128)
    }

    fn group(n: u8) -> BTreeSet<Uuid> {
        (1..=n).map(member).collect()
    }

    #[test]
    fn equal_split_divides_evenly() {
        let rule = SplitRule::Equal { members: group(3) };
        let plan = rule.resolve(Money::new(9000), &group(3)).unwrap();
        let amounts: Vec<i64> = plan.shares().iter().map(|s| s.amount.minor()).collect();
        assert_eq!(amounts, vec![3000, 3000, 3000]);
    }

    #[test]
    fn equal_split_remainder_goes_to_smallest_ids() {
        let rule = SplitRule::Equal { members: group(3) };
        let plan = rule.resolve(Money::new(100), &group(3)).unwrap();
        assert_eq!(plan.total(), Money::new(100));
        assert_eq!(plan.shares()[0].member_id, member(1));
        assert_eq!(plan.shares()[0].amount, Money::new(34));
        assert_eq!(plan.shares()[1].amount, Money::new(33));
        assert_eq!(plan.shares()[2].amount, Money::new(33));
    }

    #[test]
    fn equal_split_rejects_non_members() {
        let rule = SplitRule::Equal { members: group(4) };
        let err = rule.resolve(Money::new(100), &group(3)).unwrap_err();
        assert_eq!(err, LedgerError::UnknownMember(member(4).to_string()));
    }

    #[test]
    fn ratio_split_two_thirds_one_third() {
        let rule = SplitRule::Ratio {
            entries: vec![
                RatioShare {
                    member_id: member(1),
                    numerator: 2,
                    denominator: 3,
                },
                RatioShare {
                    member_id: member(2),
                    numerator: 1,
                    denominator: 3,
                },
            ],
        };
        let plan = rule.resolve(Money::new(15000), &group(2)).unwrap();
        let amounts: Vec<i64> = plan.shares().iter().map(|s| s.amount.minor()).collect();
        assert_eq!(amounts, vec![10000, 5000]);
    }

    #[test]
    fn ratio_split_leftover_goes_to_first_entries() {
        // 1/3 + 1/3 + 1/3 of 100: floors to 33 each, 1 unit left over.
        let entries = (1..=3)
            .map(|n| RatioShare {
                member_id: member(n),
                numerator: 1,
                denominator: 3,
            })
            .collect();
        let rule = SplitRule::Ratio { entries };
        let plan = rule.resolve(Money::new(100), &group(3)).unwrap();
        let amounts: Vec<i64> = plan.shares().iter().map(|s| s.amount.minor()).collect();
        assert_eq!(amounts, vec![34, 33, 33]);
    }

    #[test]
    fn ratio_split_rejects_uncovered_total() {
        // 1/3 alone leaves two thirds of the total unassigned.
        let rule = SplitRule::Ratio {
            entries: vec![RatioShare {
                member_id: member(1),
                numerator: 1,
                denominator: 3,
            }],
        };
        let err = rule.resolve(Money::new(9000), &group(3)).unwrap_err();
        assert!(matches!(err, LedgerError::SplitMismatch(_)));
    }

    #[test]
    fn percentage_split_exact() {
        let rule = SplitRule::Percentage {
            entries: vec![
                PercentShare {
                    member_id: member(1),
                    percent: 70,
                },
                PercentShare {
                    member_id: member(2),
                    percent: 30,
                },
            ],
        };
        let plan = rule.resolve(Money::new(10050), &group(2)).unwrap();
        let amounts: Vec<i64> = plan.shares().iter().map(|s| s.amount.minor()).collect();
        assert_eq!(amounts, vec![7035, 3015]);
    }

    #[test]
    fn percentage_split_sum_is_exact_despite_rounding() {
        let rule = SplitRule::Percentage {
            entries: vec![
                PercentShare {
                    member_id: member(1),
                    percent: 33,
                },
                PercentShare {
                    member_id: member(2),
                    percent: 33,
                },
                PercentShare {
                    member_id: member(3),
                    percent: 34,
                },
            ],
        };
        for total in [10000, 10001, 9999, 101] {
            let plan = rule.resolve(Money::new(total), &group(3)).unwrap();
            assert_eq!(plan.total(), Money::new(total), "total={total}");
        }
    }

    #[test]
    fn percentage_split_requires_sum_of_100() {
        let rule = SplitRule::Percentage {
            entries: vec![
                PercentShare {
                    member_id: member(1),
                    percent: 70,
                },
                PercentShare {
                    member_id: member(2),
                    percent: 29,
                },
            ],
        };
        let err = rule.resolve(Money::new(10000), &group(2)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }

    #[test]
    fn exact_split_must_sum_to_total() {
        let rule = SplitRule::Exact {
            entries: vec![
                (member(1), Money::new(10000)),
                (member(2), Money::new(4500)),
            ],
        };
        let err = rule.resolve(Money::new(15000), &group(2)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::SplitMismatch(
                "splits summed to 145.00 but expense total is 150.00".to_string()
            )
        );
    }

    #[test]
    fn exact_split_keeps_caller_order() {
        let rule = SplitRule::Exact {
            entries: vec![
                (member(2), Money::new(3000)),
                (member(1), Money::new(2000)),
                (member(3), Money::ZERO),
            ],
        };
        let plan = rule.resolve(Money::new(5000), &group(3)).unwrap();
        assert_eq!(plan.shares()[0].member_id, member(2));
        assert_eq!(plan.shares()[1].member_id, member(1));
        assert_eq!(plan.shares()[2].amount, Money::ZERO);
    }

    #[test]
    fn exact_split_rejects_negative_amounts() {
        let rule = SplitRule::Exact {
            entries: vec![
                (member(1), Money::new(6000)),
                (member(2), Money::new(-1000)),
            ],
        };
        let err = rule.resolve(Money::new(5000), &group(2)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }

    #[test]
    fn lend_assigns_full_amount_to_borrower() {
        let rule = SplitRule::Lend { to: member(2) };
        let plan = rule.resolve(Money::new(5000), &group(2)).unwrap();
        assert_eq!(plan.shares().len(), 1);
        assert_eq!(plan.shares()[0].member_id, member(2));
        assert_eq!(plan.shares()[0].amount, Money::new(5000));
    }

    #[test]
    fn empty_rules_are_rejected() {
        let empty_equal = SplitRule::Equal {
            members: BTreeSet::new(),
        };
        assert_eq!(
            empty_equal.resolve(Money::new(100), &group(2)).unwrap_err(),
            LedgerError::EmptyPlan
        );
        let empty_exact = SplitRule::Exact { entries: vec![] };
        assert_eq!(
            empty_exact.resolve(Money::new(100), &group(2)).unwrap_err(),
            LedgerError::EmptyPlan
        );
    }

    #[test]
    fn non_positive_totals_are_rejected() {
        let rule = SplitRule::Equal { members: group(2) };
        assert!(rule.resolve(Money::ZERO, &group(2)).is_err());
        assert!(rule.resolve(Money::new(-100), &group(2)).is_err());
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let rule = SplitRule::Exact {
            entries: vec![(member(1), Money::new(50)), (member(1), Money::new(50))],
        };
        let err = rule.resolve(Money::new(100), &group(2)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }
}
