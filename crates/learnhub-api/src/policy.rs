//! Safeguards that keep the user directory administrable. Both store
//! backends call these with the target row and a count taken under the same
//! lock as the write, so check and act cannot interleave.

use crate::models::{Role, User, UserChanges, UserStatus};

/// True when deleting `target` would remove the last admin account.
/// Counts every admin regardless of status.
pub fn removes_last_admin(target: &User, admin_count: i64) -> bool {
    target.role == Role::Admin && admin_count <= 1
}

/// True when applying `changes` to `target` would demote or block the last
/// active admin. Only active admins qualify as targets; the count covers
/// admins that are both role=admin and status=active.
pub fn demotes_last_active_admin(
    target: &User,
    changes: &UserChanges,
    active_admin_count: i64,
) -> bool {
    if target.role != Role::Admin || target.status != UserStatus::Active {
        return false;
    }
    let demoted = matches!(changes.role, Some(role) if role != Role::Admin);
    let blocked = matches!(changes.status, Some(UserStatus::Blocked));
    (demoted || blocked) && active_admin_count <= 1
}
