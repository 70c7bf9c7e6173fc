//! Expense primitives.
//!
//! An `Expense` is an atomic monetary event recorded against a group: one
//! payer, a positive total, and one split row per member stating what that
//! member owes toward it. Expenses are created once and never mutated;
//! history is only ever extended.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, LedgerError, Money, ResultLedger, splits,
    util::{model_currency, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseKind {
    Regular,
    /// A recorded transfer between two members that reduces outstanding
    /// balances. Settlements go through the same append-only history as
    /// regular expenses, never a side-channel mutation of balances.
    Settlement,
}

impl ExpenseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Settlement => "settlement",
        }
    }
}

impl TryFrom<&str> for ExpenseKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "regular" => Ok(Self::Regular),
            "settlement" => Ok(Self::Settlement),
            other => Err(LedgerError::InvalidId(format!(
                "invalid expense kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub kind: ExpenseKind,
    pub description: String,
    pub amount: Money,
    pub currency: Currency,
    pub payer_id: Uuid,
    /// The original free-form message the expense was parsed from, kept for
    /// audit.
    pub source_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub splits: Vec<splits::Split>,
}

impl Expense {
    pub fn new(
        group_id: Uuid,
        kind: ExpenseKind,
        description: String,
        amount: Money,
        currency: Currency,
        payer_id: Uuid,
        source_text: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultLedger<Self> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "expense amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            kind,
            description,
            amount,
            currency,
            payer_id,
            source_text,
            created_at,
            splits: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub kind: String,
    pub description: String,
    pub amount_minor: i64,
    pub currency: String,
    pub payer_id: String,
    pub source_text: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            group_id: ActiveValue::Set(expense.group_id.to_string()),
            kind: ActiveValue::Set(expense.kind.as_str().to_string()),
            description: ActiveValue::Set(expense.description.clone()),
            amount_minor: ActiveValue::Set(expense.amount.minor()),
            currency: ActiveValue::Set(expense.currency.code().to_string()),
            payer_id: ActiveValue::Set(expense.payer_id.to_string()),
            source_text: ActiveValue::Set(expense.source_text.clone()),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "expense")?,
            group_id: parse_uuid(&model.group_id, "group")?,
            kind: ExpenseKind::try_from(model.kind.as_str())?,
            description: model.description,
            amount: Money::new(model.amount_minor),
            currency: model_currency(&model.currency)?,
            payer_id: parse_uuid(&model.payer_id, "member")?,
            source_text: model.source_text,
            created_at: model.created_at,
            splits: Vec::new(),
        })
    }
}
