//! Groups and their membership sets.
//!
//! A `Group` is a named collection of members; expenses are always recorded
//! against a group, and every member referenced by an expense or a split
//! must belong to it. The member set is kept as a `BTreeSet` so that
//! iteration order is the ascending member id the deterministic split and
//! settlement rules rely on.

use sea_orm::{ActiveValue, entity::prelude::*};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::{LedgerError, memberships, util::parse_uuid};

/// A named collection of members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    /// Member ids, ascending. A group always has at least one member before
    /// any expense may be recorded against it.
    pub members: BTreeSet<Uuid>,
}

impl Group {
    pub fn new(name: String, members: BTreeSet<Uuid>) -> Result<Self, LedgerError> {
        if members.is_empty() {
            return Err(LedgerError::InvalidAmount(
                "a group must have at least one member".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            members,
        })
    }

    /// Returns `true` if `member_id` belongs to this group.
    #[must_use]
    pub fn contains(&self, member_id: Uuid) -> bool {
        self.members.contains(&member_id)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::memberships::Entity")]
    Memberships,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Group> for ActiveModel {
    fn from(group: &Group) -> Self {
        Self {
            id: ActiveValue::Set(group.id.to_string()),
            name: ActiveValue::Set(group.name.clone()),
        }
    }
}

/// Rebuilds a [`Group`] from its row and membership rows.
impl TryFrom<(Model, Vec<memberships::Model>)> for Group {
    type Error = LedgerError;

    fn try_from(
        (model, membership_models): (Model, Vec<memberships::Model>),
    ) -> Result<Self, Self::Error> {
        let mut members = BTreeSet::new();
        for membership in membership_models {
            members.insert(parse_uuid(&membership.member_id, "member")?);
        }
        Ok(Self {
            id: parse_uuid(&model.id, "group")?,
            name: model.name,
            members,
        })
    }
}
