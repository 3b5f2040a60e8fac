use crate::models::{MediaRecord, UserPermissions};

/// Whether `user` may see `record`. Pure rule evaluation; no storage, no
/// side effects.
///
/// Precedence, highest first: a record-level restriction denies; a
/// record-level allowance, ownership, or a viewable visibility tier allows;
/// anything else denies. Independently of that chain, a user's denied-tag
/// list always excludes a matching record, and a non-empty allowed-tag list
/// requires a match.
pub fn is_accessible(user: &UserPermissions, record: &MediaRecord) -> bool {
    if record.restricted_users.iter().any(|u| *u == user.user_id) {
        return false;
    }

    let custom = &user.custom_access;
    if intersects(&custom.denied_tags, &record.tags) {
        return false;
    }
    if !custom.allowed_tags.is_empty() && !intersects(&custom.allowed_tags, &record.tags) {
        return false;
    }

    if record.allowed_users.iter().any(|u| *u == user.user_id) {
        return true;
    }
    if record.uploaded_by == user.user_id {
        return true;
    }
    user.can_view(record.visibility)
}

/// Case-insensitive intersection test. Record tags are already lowercase;
/// the custom-access lists may come from UI input, so they are folded here.
fn intersects(list: &[String], tags: &[String]) -> bool {
    list.iter()
        .any(|item| tags.iter().any(|tag| tag.eq_ignore_ascii_case(item.trim())))
}
