use thiserror::Error;

use splitledger_core::MemberId;
use splitledger_groups::Group;

use crate::GroupAction;

/// Authorization failure, surfaced distinctly from validation so clients can
/// tell "fix your input" apart from "you can't do this".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("actor must be a group admin")]
    NotAdmin,

    #[error("member {0} is not a current member of the group")]
    NotAMember(MemberId),

    #[error("cannot remove the last admin of a group")]
    LastAdminRemoval,
}

/// Authorize an actor's action against a group's current membership.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
///
/// This is consulted before any ledger mutation; the ledger itself trusts its
/// caller and performs no authorization.
pub fn authorize(actor: MemberId, group: &Group, action: &GroupAction) -> Result<(), AuthError> {
    if !group.is_member(actor) {
        return Err(AuthError::NotAMember(actor));
    }

    match action {
        GroupAction::AddMember { .. } | GroupAction::UpdateGroupSettings => {
            require_admin(actor, group)
        }
        GroupAction::RemoveMember { member } => {
            require_admin(actor, group)?;
            if !group.is_member(*member) {
                return Err(AuthError::NotAMember(*member));
            }
            if group.is_admin(*member) && group.admin_count() == 1 {
                return Err(AuthError::LastAdminRemoval);
            }
            Ok(())
        }
        GroupAction::RecordExpense { payer, participants }
        | GroupAction::AmendExpense { payer, participants } => {
            require_members(group, core::iter::once(*payer).chain(participants.iter().copied()))
        }
        GroupAction::ReverseExpense => Ok(()),
        GroupAction::RecordSettlement { from, to } => {
            require_members(group, [*from, *to].into_iter())
        }
    }
}

fn require_admin(actor: MemberId, group: &Group) -> Result<(), AuthError> {
    if group.is_admin(actor) {
        Ok(())
    } else {
        Err(AuthError::NotAdmin)
    }
}

fn require_members(
    group: &Group,
    members: impl Iterator<Item = MemberId>,
) -> Result<(), AuthError> {
    for member in members {
        if !group.is_member(member) {
            return Err(AuthError::NotAMember(member));
        }
    }
    Ok(())
}
