use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use sea_orm::Database;
use uuid::Uuid;

use ledger::{
    ExpenseKind, Ledger, LedgerError, Money, SettlementPolicy, SplitRule,
};
use migration::MigratorTrait;

async fn ledger_with_db() -> Ledger {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Ledger::builder().database(db).build()
}

async fn seed_members(ledger: &Ledger, names: &[&str]) -> Vec<Uuid> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        ids.push(ledger.create_member(name, "password").await.unwrap().id);
    }
    ids
}

#[tokio::test]
async fn record_expense_persists_expense_with_splits() {
    let ledger = ledger_with_db().await;
    let members = seed_members(&ledger, &["Alice", "Bob", "Carol"]).await;
    let group = ledger.create_group("Flat", &members).await.unwrap();

    let rule = SplitRule::Equal {
        members: members.iter().copied().collect(),
    };
    let expense_id = ledger
        .record_expense(
            group.id,
            members[0],
            Money::new(9000),
            "dinner",
            &rule,
            Some("I paid $90 for dinner, split equally"),
            Utc::now(),
        )
        .await
        .unwrap();

    let expense = ledger.expense_with_splits(expense_id).await.unwrap();
    assert_eq!(expense.kind, ExpenseKind::Regular);
    assert_eq!(expense.description, "dinner");
    assert_eq!(expense.amount, Money::new(9000));
    assert_eq!(expense.payer_id, members[0]);
    assert_eq!(
        expense.source_text.as_deref(),
        Some("I paid $90 for dinner, split equally")
    );
    assert_eq!(expense.splits.len(), 3);
    for split in &expense.splits {
        assert_eq!(split.amount, Money::new(3000));
        assert_eq!(split.expense_id, expense_id);
    }
    let split_members: BTreeSet<Uuid> = expense.splits.iter().map(|s| s.member_id).collect();
    assert_eq!(split_members, members.iter().copied().collect());
}

#[tokio::test]
async fn record_expense_rejects_payer_outside_group() {
    let ledger = ledger_with_db().await;
    let members = seed_members(&ledger, &["Alice", "Bob"]).await;
    let outsider = seed_members(&ledger, &["Mallory"]).await[0];
    let group = ledger.create_group("Flat", &members).await.unwrap();

    let rule = SplitRule::Equal {
        members: members.iter().copied().collect(),
    };
    let err = ledger
        .record_expense(
            group.id,
            outsider,
            Money::new(1000),
            "coffee",
            &rule,
            None,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::UnknownMember(outsider.to_string()));

    let page = ledger.list_group_expenses(group.id, 10, None).await.unwrap();
    assert!(page.expenses.is_empty());
}

#[tokio::test]
async fn rejected_exact_plan_leaves_no_partial_state() {
    let ledger = ledger_with_db().await;
    let members = seed_members(&ledger, &["Alice", "Bob"]).await;
    let group = ledger.create_group("Flat", &members).await.unwrap();

    let rule = SplitRule::Exact {
        entries: vec![
            (members[0], Money::new(10000)),
            (members[1], Money::new(4500)),
        ],
    };
    let err = ledger
        .record_expense(
            group.id,
            members[0],
            Money::new(15000),
            "groceries",
            &rule,
            None,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::SplitMismatch(_)));

    let page = ledger.list_group_expenses(group.id, 10, None).await.unwrap();
    assert!(page.expenses.is_empty());
    let balances = ledger.group_breakdown(group.id).await.unwrap();
    assert!(balances.values().all(|b| b.net().is_zero()));
}

#[tokio::test]
async fn group_breakdown_nets_sum_to_zero() {
    let ledger = ledger_with_db().await;
    let members = seed_members(&ledger, &["Alice", "Bob", "Carol"]).await;
    let group = ledger.create_group("Flat", &members).await.unwrap();

    ledger
        .record_expense(
            group.id,
            members[0],
            Money::new(9000),
            "dinner",
            &SplitRule::Equal {
                members: members.iter().copied().collect(),
            },
            None,
            Utc::now(),
        )
        .await
        .unwrap();

    let balances = ledger.group_breakdown(group.id).await.unwrap();
    assert_eq!(balances[&members[0]].net(), Money::new(6000));
    assert_eq!(balances[&members[1]].net(), Money::new(-3000));
    assert_eq!(balances[&members[2]].net(), Money::new(-3000));
    let net_sum: i64 = balances.values().map(|b| b.net().minor()).sum();
    assert_eq!(net_sum, 0);

    // Pure read: calling again without writes returns identical results.
    let again = ledger.group_breakdown(group.id).await.unwrap();
    assert_eq!(balances, again);
}

#[tokio::test]
async fn lend_rule_attributes_whole_amount_to_borrower() {
    let ledger = ledger_with_db().await;
    let members = seed_members(&ledger, &["Alice", "Bob"]).await;
    let group = ledger.create_group("Flat", &members).await.unwrap();

    ledger
        .record_expense(
            group.id,
            members[0],
            Money::new(5000),
            "loan",
            &SplitRule::Lend { to: members[1] },
            Some("I lent $50 to Bob"),
            Utc::now(),
        )
        .await
        .unwrap();

    let balances = ledger.group_breakdown(group.id).await.unwrap();
    assert_eq!(balances[&members[0]].net(), Money::new(5000));
    assert_eq!(balances[&members[1]].net(), Money::new(-5000));
}

#[tokio::test]
async fn settlement_drives_balances_to_zero_and_stays_in_history() {
    let ledger = ledger_with_db().await;
    let members = seed_members(&ledger, &["Alice", "Bob"]).await;
    let group = ledger.create_group("Flat", &members).await.unwrap();

    ledger
        .record_expense(
            group.id,
            members[0],
            Money::new(6000),
            "tickets",
            &SplitRule::Equal {
                members: members.iter().copied().collect(),
            },
            None,
            Utc::now(),
        )
        .await
        .unwrap();

    // Bob owes 3000; settling exactly that drives both nets to zero.
    let settlement_id = ledger
        .record_settlement(
            group.id,
            members[1],
            members[0],
            Money::new(3000),
            SettlementPolicy::Strict,
            Utc::now(),
        )
        .await
        .unwrap();

    let balances = ledger.group_breakdown(group.id).await.unwrap();
    assert!(balances.values().all(|b| b.net().is_zero()));

    let settlement = ledger.expense_with_splits(settlement_id).await.unwrap();
    assert_eq!(settlement.kind, ExpenseKind::Settlement);
    assert_eq!(settlement.payer_id, members[1]);
    assert_eq!(settlement.splits.len(), 1);
    assert_eq!(settlement.splits[0].member_id, members[0]);
    assert_eq!(settlement.splits[0].amount, Money::new(3000));

    let page = ledger.list_group_expenses(group.id, 10, None).await.unwrap();
    assert_eq!(page.expenses.len(), 2);
}

#[tokio::test]
async fn strict_settlement_rejects_overshoot_advisory_accepts() {
    let ledger = ledger_with_db().await;
    let members = seed_members(&ledger, &["Alice", "Bob"]).await;
    let group = ledger.create_group("Flat", &members).await.unwrap();

    ledger
        .record_expense(
            group.id,
            members[0],
            Money::new(6000),
            "tickets",
            &SplitRule::Equal {
                members: members.iter().copied().collect(),
            },
            None,
            Utc::now(),
        )
        .await
        .unwrap();

    let err = ledger
        .record_settlement(
            group.id,
            members[1],
            members[0],
            Money::new(3001),
            SettlementPolicy::Strict,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidSettlement(_)));

    ledger
        .record_settlement(
            group.id,
            members[1],
            members[0],
            Money::new(3001),
            SettlementPolicy::Advisory,
            Utc::now(),
        )
        .await
        .unwrap();

    let balances = ledger.group_breakdown(group.id).await.unwrap();
    assert_eq!(balances[&members[1]].net(), Money::new(1));
}

#[tokio::test]
async fn propose_settlement_covers_all_debts() {
    let ledger = ledger_with_db().await;
    let members = seed_members(&ledger, &["Alice", "Bob", "Carol"]).await;
    let group = ledger.create_group("Flat", &members).await.unwrap();

    ledger
        .record_expense(
            group.id,
            members[0],
            Money::new(9000),
            "dinner",
            &SplitRule::Equal {
                members: members.iter().copied().collect(),
            },
            None,
            Utc::now(),
        )
        .await
        .unwrap();

    let transfers = ledger.propose_settlement(group.id).await.unwrap();
    assert_eq!(transfers.len(), 2);
    assert!(transfers.iter().all(|t| t.creditor == members[0]));
    assert!(transfers.iter().all(|t| t.amount == Money::new(3000)));
    let debtors: BTreeSet<Uuid> = transfers.iter().map(|t| t.debtor).collect();
    assert_eq!(debtors, members[1..].iter().copied().collect());
}

#[tokio::test]
async fn expense_listing_paginates_newest_first() {
    let ledger = ledger_with_db().await;
    let members = seed_members(&ledger, &["Alice"]).await;
    let group = ledger.create_group("Solo", &members).await.unwrap();

    for (day, description) in [(1, "first"), (2, "second"), (3, "third")] {
        ledger
            .record_expense(
                group.id,
                members[0],
                Money::new(100),
                description,
                &SplitRule::Equal {
                    members: members.iter().copied().collect(),
                },
                None,
                Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap(),
            )
            .await
            .unwrap();
    }

    let first_page = ledger.list_group_expenses(group.id, 2, None).await.unwrap();
    assert_eq!(first_page.expenses.len(), 2);
    assert_eq!(first_page.expenses[0].description, "third");
    assert_eq!(first_page.expenses[1].description, "second");
    let cursor = first_page.next_cursor.expect("expected another page");

    let second_page = ledger
        .list_group_expenses(group.id, 2, Some(&cursor))
        .await
        .unwrap();
    assert_eq!(second_page.expenses.len(), 1);
    assert_eq!(second_page.expenses[0].description, "first");
    assert!(second_page.next_cursor.is_none());
}

#[tokio::test]
async fn member_breakdown_reports_each_group() {
    let ledger = ledger_with_db().await;
    let members = seed_members(&ledger, &["Alice", "Bob"]).await;
    let flat = ledger.create_group("Flat", &members).await.unwrap();
    let trip = ledger.create_group("Trip", &members).await.unwrap();

    ledger
        .record_expense(
            flat.id,
            members[0],
            Money::new(2000),
            "cleaning",
            &SplitRule::Lend { to: members[1] },
            None,
            Utc::now(),
        )
        .await
        .unwrap();

    let breakdowns = ledger.member_breakdown(members[1]).await.unwrap();
    assert_eq!(breakdowns.len(), 2);
    for (group_id, balance) in breakdowns {
        if group_id == flat.id {
            assert_eq!(balance.net(), Money::new(-2000));
        } else {
            assert_eq!(group_id, trip.id);
            assert_eq!(balance.net(), Money::ZERO);
        }
    }
}

#[tokio::test]
async fn groups_require_members_and_unique_names() {
    let ledger = ledger_with_db().await;

    let err = ledger.create_group("Empty", &[]).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    seed_members(&ledger, &["Alice"]).await;
    let err = ledger.create_member("Alice", "other").await.unwrap_err();
    assert_eq!(err, LedgerError::ExistingKey("Alice".to_string()));
}

#[tokio::test]
async fn added_member_participates_in_future_splits() {
    let ledger = ledger_with_db().await;
    let members = seed_members(&ledger, &["Alice", "Bob"]).await;
    let group = ledger.create_group("Flat", &members).await.unwrap();

    let carol = seed_members(&ledger, &["Carol"]).await[0];
    ledger.add_group_member(group.id, carol).await.unwrap();

    let roster = ledger.group_members(group.id).await.unwrap();
    assert_eq!(roster.len(), 3);
    assert!(roster.iter().any(|m| m.name == "Carol"));

    let mut everyone: BTreeSet<Uuid> = members.iter().copied().collect();
    everyone.insert(carol);
    ledger
        .record_expense(
            group.id,
            carol,
            Money::new(3000),
            "snacks",
            &SplitRule::Equal { members: everyone },
            None,
            Utc::now(),
        )
        .await
        .unwrap();

    let balances = ledger.group_breakdown(group.id).await.unwrap();
    assert_eq!(balances[&carol].net(), Money::new(2000));
}
