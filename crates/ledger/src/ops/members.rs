use sea_orm::{ActiveValue, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{LedgerError, Member, ResultLedger, members};

use super::{Ledger, normalize_required_name};

impl Ledger {
    /// Creates a member with a unique, NFC-normalized display name.
    pub async fn create_member(&self, name: &str, password: &str) -> ResultLedger<Member> {
        let name = normalize_required_name(name, "member")?;

        let existing = members::Entity::find()
            .filter(members::Column::Name.eq(name.clone()))
            .one(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?;
        if existing.is_some() {
            return Err(LedgerError::ExistingKey(name));
        }

        let member = Member {
            id: Uuid::new_v4(),
            name,
        };
        let model = members::ActiveModel {
            id: ActiveValue::Set(member.id.to_string()),
            name: ActiveValue::Set(member.name.clone()),
            password: ActiveValue::Set(password.to_string()),
        };
        model
            .insert(&self.database)
            .await
            .map_err(LedgerError::WriteFailed)?;

        Ok(member)
    }

    /// Returns a member by id.
    pub async fn member(&self, member_id: Uuid) -> ResultLedger<Member> {
        let model = members::Entity::find_by_id(member_id.to_string())
            .one(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?
            .ok_or_else(|| LedgerError::MemberNotFound(member_id.to_string()))?;
        Member::try_from(model)
    }

    /// Returns a member by exact (normalized) display name.
    pub async fn member_by_name(&self, name: &str) -> ResultLedger<Member> {
        let name = normalize_required_name(name, "member")?;
        let model = members::Entity::find()
            .filter(members::Column::Name.eq(name.clone()))
            .one(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?
            .ok_or_else(|| LedgerError::MemberNotFound(name))?;
        Member::try_from(model)
    }
}
