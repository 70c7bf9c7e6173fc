//! Members table.
//!
//! A member is an identity that participates in groups. Members are created
//! once and referenced by id everywhere else (expenses, splits,
//! memberships); they are never embedded.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{LedgerError, util::parse_uuid};

/// A member identity: stable id plus display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub password: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Member {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "member")?,
            name: model.name,
        })
    }
}
