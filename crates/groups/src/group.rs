use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use splitledger_core::{Currency, GroupId, MemberId};

/// Role a member holds within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
}

/// Membership record for one current member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub member_id: MemberId,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// Structural membership violation (not an authorization concern).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GroupError {
    #[error("group name cannot be empty")]
    EmptyName,

    #[error("member {0} is already in the group")]
    DuplicateMember(MemberId),

    #[error("member {0} is not in the group")]
    UnknownMember(MemberId),
}

/// An expense-sharing group.
///
/// Invariants:
/// - at least one admin at all times (enforced at the authorization boundary,
///   which is consulted before every membership mutation);
/// - removed members are retained in `former_members` so historical expenses
///   and settlements keep resolving to a known member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    id: GroupId,
    name: String,
    description: String,
    currency: Currency,
    members: BTreeMap<MemberId, GroupMember>,
    former_members: BTreeSet<MemberId>,
    created_at: DateTime<Utc>,
}

impl Group {
    /// Create a group. The creator becomes the sole admin; founding members
    /// join with the `member` role.
    pub fn create(
        id: GroupId,
        name: impl Into<String>,
        description: impl Into<String>,
        currency: Currency,
        creator: MemberId,
        founding_members: &[MemberId],
        created_at: DateTime<Utc>,
    ) -> Result<Self, GroupError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GroupError::EmptyName);
        }

        let mut members = BTreeMap::new();
        members.insert(
            creator,
            GroupMember {
                member_id: creator,
                role: MemberRole::Admin,
                joined_at: created_at,
            },
        );

        for &member_id in founding_members {
            if members.contains_key(&member_id) {
                return Err(GroupError::DuplicateMember(member_id));
            }
            members.insert(
                member_id,
                GroupMember {
                    member_id,
                    role: MemberRole::Member,
                    joined_at: created_at,
                },
            );
        }

        Ok(Self {
            id,
            name,
            description: description.into(),
            currency,
            members,
            former_members: BTreeSet::new(),
            created_at,
        })
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current members in ascending `MemberId` order (the stable ordering).
    pub fn members(&self) -> impl Iterator<Item = &GroupMember> {
        self.members.values()
    }

    /// Current member ids in ascending order.
    pub fn member_ids(&self) -> Vec<MemberId> {
        self.members.keys().copied().collect()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_member(&self, member_id: MemberId) -> bool {
        self.members.contains_key(&member_id)
    }

    pub fn is_former_member(&self, member_id: MemberId) -> bool {
        self.former_members.contains(&member_id)
    }

    /// Whether expenses/settlements may legitimately reference this member.
    pub fn is_current_or_former_member(&self, member_id: MemberId) -> bool {
        self.is_member(member_id) || self.is_former_member(member_id)
    }

    pub fn role_of(&self, member_id: MemberId) -> Option<MemberRole> {
        self.members.get(&member_id).map(|m| m.role)
    }

    pub fn is_admin(&self, member_id: MemberId) -> bool {
        self.role_of(member_id) == Some(MemberRole::Admin)
    }

    pub fn admin_count(&self) -> usize {
        self.members
            .values()
            .filter(|m| m.role == MemberRole::Admin)
            .count()
    }

    /// Add a member with the `member` role. A former member may rejoin; they
    /// leave the former-member set.
    pub fn add_member(
        &mut self,
        member_id: MemberId,
        joined_at: DateTime<Utc>,
    ) -> Result<(), GroupError> {
        if self.members.contains_key(&member_id) {
            return Err(GroupError::DuplicateMember(member_id));
        }
        self.former_members.remove(&member_id);
        self.members.insert(
            member_id,
            GroupMember {
                member_id,
                role: MemberRole::Member,
                joined_at,
            },
        );
        Ok(())
    }

    /// Remove a current member, retaining them as a former member.
    ///
    /// Role invariants (last admin) are the authorization boundary's concern;
    /// this only enforces that the member exists.
    pub fn remove_member(&mut self, member_id: MemberId) -> Result<(), GroupError> {
        if self.members.remove(&member_id).is_none() {
            return Err(GroupError::UnknownMember(member_id));
        }
        self.former_members.insert(member_id);
        Ok(())
    }

    /// Update group settings. `None` keeps the existing value.
    ///
    /// Whether a currency change is allowed at all (it is not once ledger
    /// activity exists) is decided by the engine before calling this.
    pub fn update_settings(
        &mut self,
        name: Option<String>,
        description: Option<String>,
        currency: Option<Currency>,
    ) -> Result<(), GroupError> {
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(GroupError::EmptyName);
            }
            self.name = name;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(currency) = currency {
            self.currency = currency;
        }
        Ok(())
    }
}
