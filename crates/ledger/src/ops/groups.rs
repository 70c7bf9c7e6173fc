use std::collections::BTreeSet;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Group, LedgerError, Member, ResultLedger, groups, members, memberships};

use super::{Ledger, normalize_required_name, with_tx};

impl Ledger {
    /// Creates a group with an initial member set.
    ///
    /// A group must be born with at least one member, so that expenses can
    /// always be attributed to somebody.
    pub async fn create_group(&self, name: &str, member_ids: &[Uuid]) -> ResultLedger<Group> {
        let name = normalize_required_name(name, "group")?;
        let members: BTreeSet<Uuid> = member_ids.iter().copied().collect();
        let group = Group::new(name, members)?;

        self.require_members_exist(&group.members).await?;

        with_tx!(self, |db_tx| {
            async {
                groups::ActiveModel::from(&group)
                    .insert(&db_tx)
                    .await
                    .map_err(LedgerError::WriteFailed)?;
                for member_id in &group.members {
                    let membership = memberships::ActiveModel {
                        group_id: ActiveValue::Set(group.id.to_string()),
                        member_id: ActiveValue::Set(member_id.to_string()),
                    };
                    membership
                        .insert(&db_tx)
                        .await
                        .map_err(LedgerError::WriteFailed)?;
                }
                Ok(())
            }
            .await
        })?;

        Ok(group)
    }

    /// Returns a group with its member set.
    pub async fn group(&self, group_id: Uuid) -> ResultLedger<Group> {
        let model = groups::Entity::find_by_id(group_id.to_string())
            .one(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))?;

        let membership_models = memberships::Entity::find()
            .filter(memberships::Column::GroupId.eq(group_id.to_string()))
            .all(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?;

        Group::try_from((model, membership_models))
    }

    /// Adds a member to an existing group.
    pub async fn add_group_member(&self, group_id: Uuid, member_id: Uuid) -> ResultLedger<()> {
        let group = self.group(group_id).await?;
        if group.contains(member_id) {
            return Err(LedgerError::ExistingKey(member_id.to_string()));
        }
        self.member(member_id).await?;

        let membership = memberships::ActiveModel {
            group_id: ActiveValue::Set(group_id.to_string()),
            member_id: ActiveValue::Set(member_id.to_string()),
        };
        membership
            .insert(&self.database)
            .await
            .map_err(LedgerError::WriteFailed)?;
        Ok(())
    }

    /// Returns the member records of a group, ordered by id.
    pub async fn group_members(&self, group_id: Uuid) -> ResultLedger<Vec<Member>> {
        let group = self.group(group_id).await?;

        let models = members::Entity::find()
            .filter(
                members::Column::Id
                    .is_in(group.members.iter().map(Uuid::to_string).collect::<Vec<_>>()),
            )
            .order_by_asc(members::Column::Id)
            .all(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?;

        models.into_iter().map(Member::try_from).collect()
    }

    /// Returns every group the member belongs to.
    pub async fn member_groups(&self, member_id: Uuid) -> ResultLedger<Vec<Group>> {
        self.member(member_id).await?;

        let membership_models = memberships::Entity::find()
            .filter(memberships::Column::MemberId.eq(member_id.to_string()))
            .order_by_asc(memberships::Column::GroupId)
            .all(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?;

        let mut groups = Vec::with_capacity(membership_models.len());
        for membership in membership_models {
            let group_id = crate::util::parse_uuid(&membership.group_id, "group")?;
            groups.push(self.group(group_id).await?);
        }
        Ok(groups)
    }

    async fn require_members_exist(&self, member_ids: &BTreeSet<Uuid>) -> ResultLedger<()> {
        let ids: Vec<String> = member_ids.iter().map(Uuid::to_string).collect();
        let found = members::Entity::find()
            .filter(members::Column::Id.is_in(ids.clone()))
            .all(&self.database)
            .await
            .map_err(LedgerError::ReadFailed)?;

        if found.len() != member_ids.len() {
            let found_ids: BTreeSet<String> = found.into_iter().map(|m| m.id).collect();
            let missing = ids
                .into_iter()
                .find(|id| !found_ids.contains(id))
                .unwrap_or_default();
            return Err(LedgerError::MemberNotFound(missing));
        }
        Ok(())
    }
}
