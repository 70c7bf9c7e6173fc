//! Expense split rows.
//!
//! A [`Split`] states the amount one member owes toward one expense. Split
//! rows are created atomically with their expense and never mutated
//! afterwards; a split cannot outlive its expense.
//!
//! Invariant: for every expense, the split amounts sum exactly to the
//! expense amount. The [`SplitRule`](crate::SplitRule) resolution enforces
//! this before anything is written.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{
    Currency, LedgerError, Money,
    util::{model_currency, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub member_id: Uuid,
    /// Amount owed by `member_id`; non-negative, may be zero.
    pub amount: Money,
    pub currency: Currency,
}

impl Split {
    pub fn new(expense_id: Uuid, member_id: Uuid, amount: Money, currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4(),
            expense_id,
            member_id,
            amount,
            currency,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub expense_id: String,
    pub member_id: String,
    pub amount_minor: i64,
    pub currency: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Split> for ActiveModel {
    fn from(split: &Split) -> Self {
        Self {
            id: ActiveValue::Set(split.id.to_string()),
            expense_id: ActiveValue::Set(split.expense_id.to_string()),
            member_id: ActiveValue::Set(split.member_id.to_string()),
            amount_minor: ActiveValue::Set(split.amount.minor()),
            currency: ActiveValue::Set(split.currency.code().to_string()),
        }
    }
}

impl TryFrom<Model> for Split {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "split")?,
            expense_id: parse_uuid(&model.expense_id, "expense")?,
            member_id: parse_uuid(&model.member_id, "member")?,
            amount: Money::new(model.amount_minor),
            currency: model_currency(&model.currency)?,
        })
    }
}
