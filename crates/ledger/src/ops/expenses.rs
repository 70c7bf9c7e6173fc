use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, LedgerError, Money, ResultLedger, SplitPlan, SplitRule,
    expenses::{Expense, ExpenseKind},
    splits::{self, Split},
    util::parse_uuid,
};

use super::{Ledger, normalize_optional_text, with_tx};

/// One page of a group's expense history, newest first.
#[derive(Debug)]
pub struct ExpensePage {
    pub expenses: Vec<Expense>,
    /// Opaque cursor for fetching the next (older) page.
    pub next_cursor: Option<String>,
}

impl Ledger {
    /// Records an expense against a group.
    ///
    /// The payer must belong to the group and the splitting rule must
    /// resolve against the group's member set; only then are the expense
    /// row and all of its split rows written, inside a single transaction.
    /// A failure at any point leaves the ledger untouched.
    pub async fn record_expense(
        &self,
        group_id: Uuid,
        payer_id: Uuid,
        amount: Money,
        description: &str,
        rule: &SplitRule,
        source_text: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> ResultLedger<Uuid> {
        let group = self.group(group_id).await?;
        if !group.contains(payer_id) {
            return Err(LedgerError::UnknownMember(payer_id.to_string()));
        }

        let plan = rule.resolve(amount, &group.members)?;
        let expense = Expense::new(
            group_id,
            ExpenseKind::Regular,
            description.to_string(),
            amount,
            Currency::default(),
            payer_id,
            normalize_optional_text(source_text),
            created_at,
        )?;

        self.persist_expense(expense, plan).await
    }

    /// Writes an expense and its splits as one atomic unit.
    pub(super) async fn persist_expense(
        &self,
        mut expense: Expense,
        plan: SplitPlan,
    ) -> ResultLedger<Uuid> {
        expense.splits = plan
            .shares()
            .iter()
            .map(|share| Split::new(expense.id, share.member_id, share.amount, expense.currency))
            .collect();

        with_tx!(self, |db_tx| {
            async {
                crate::expenses::ActiveModel::from(&expense)
                    .insert(&db_tx)
                    .await
                    .map_err(LedgerError::WriteFailed)?;
                for split in &expense.splits {
                    splits::ActiveModel::from(split)
                        .insert(&db_tx)
                        .await
                        .map_err(LedgerError::WriteFailed)?;
                }
                Ok(expense.id)
            }
            .await
        })
    }

    /// Returns one expense with its split rows (ordered by member id).
    pub async fn expense_with_splits(&self, expense_id: Uuid) -> ResultLedger<Expense> {
        let model = crate::expenses::Entity::find_by_id(expense_id.to_string())
            .one(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?
            .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))?;

        let mut expense = Expense::try_from(model)?;
        let split_models = splits::Entity::find()
            .filter(splits::Column::ExpenseId.eq(expense_id.to_string()))
            .order_by_asc(splits::Column::MemberId)
            .all(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?;
        expense.splits = split_models
            .into_iter()
            .map(Split::try_from)
            .collect::<ResultLedger<Vec<_>>>()?;

        Ok(expense)
    }

    /// Lists a group's expenses newest-first, `limit` at a time.
    ///
    /// `cursor` is the opaque token from a previous page's `next_cursor`.
    pub async fn list_group_expenses(
        &self,
        group_id: Uuid,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultLedger<ExpensePage> {
        self.group(group_id).await?;

        let mut query = crate::expenses::Entity::find()
            .filter(crate::expenses::Column::GroupId.eq(group_id.to_string()))
            .order_by_desc(crate::expenses::Column::CreatedAt)
            .order_by_desc(crate::expenses::Column::Id)
            .limit(limit + 1);

        if let Some(cursor) = cursor {
            let (created_at, id) = decode_cursor(cursor)?;
            query = query.filter(
                Condition::any()
                    .add(crate::expenses::Column::CreatedAt.lt(created_at))
                    .add(
                        Condition::all()
                            .add(crate::expenses::Column::CreatedAt.eq(created_at))
                            .add(crate::expenses::Column::Id.lt(id.to_string())),
                    ),
            );
        }

        let mut models = query
            .all(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?;

        let has_more = models.len() as u64 > limit;
        if has_more {
            models.truncate(limit as usize);
        }

        let mut expenses = models
            .into_iter()
            .map(Expense::try_from)
            .collect::<ResultLedger<Vec<_>>>()?;
        self.attach_splits(&mut expenses).await?;

        let next_cursor = if has_more {
            expenses
                .last()
                .map(|expense| encode_cursor(expense.created_at, expense.id))
        } else {
            None
        };

        Ok(ExpensePage {
            expenses,
            next_cursor,
        })
    }

    /// Loads a group's full expense history with splits attached; the
    /// aggregation input for balance computation.
    pub(super) async fn load_group_expenses_with_splits(
        &self,
        group_id: Uuid,
    ) -> ResultLedger<Vec<Expense>> {
        let models = crate::expenses::Entity::find()
            .filter(crate::expenses::Column::GroupId.eq(group_id.to_string()))
            .all(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?;

        let mut expenses = models
            .into_iter()
            .map(Expense::try_from)
            .collect::<ResultLedger<Vec<_>>>()?;
        self.attach_splits(&mut expenses).await?;
        Ok(expenses)
    }

    async fn attach_splits(&self, expenses: &mut [Expense]) -> ResultLedger<()> {
        if expenses.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = expenses
            .iter()
            .map(|expense| expense.id.to_string())
            .collect();
        let split_models = splits::Entity::find()
            .filter(splits::Column::ExpenseId.is_in(ids))
            .order_by_asc(splits::Column::MemberId)
            .all(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?;

        let mut by_expense: HashMap<Uuid, Vec<Split>> = HashMap::new();
        for model in split_models {
            let split = Split::try_from(model)?;
            by_expense.entry(split.expense_id).or_default().push(split);
        }
        for expense in expenses {
            expense.splits = by_expense.remove(&expense.id).unwrap_or_default();
        }
        Ok(())
    }
}

fn encode_cursor(created_at: DateTime<Utc>, id: Uuid) -> String {
    URL_SAFE_NO_PAD.encode(format!("{}|{id}", created_at.to_rfc3339()))
}

fn decode_cursor(cursor: &str) -> ResultLedger<(DateTime<Utc>, Uuid)> {
    let invalid = || LedgerError::InvalidId("invalid cursor".to_string());

    let raw = URL_SAFE_NO_PAD.decode(cursor).map_err(|_| invalid())?;
    let raw = String::from_utf8(raw).map_err(|_| invalid())?;
    let (created_at, id) = raw.split_once('|').ok_or_else(invalid)?;

    let created_at = DateTime::parse_from_rfc3339(created_at)
        .map_err(|_| invalid())?
        .with_timezone(&Utc);
    let id = parse_uuid(id, "expense")?;
    Ok((created_at, id))
}
