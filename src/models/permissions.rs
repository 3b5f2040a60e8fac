use crate::error::CoreError;
use crate::models::Visibility;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    Family,
    ExtendedFamily,
    Friend,
    Guest,
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "family" => Ok(Role::Family),
            "extended-family" => Ok(Role::ExtendedFamily),
            "friend" => Ok(Role::Friend),
            "guest" => Ok(Role::Guest),
            other => Err(CoreError::Validation(format!("Unrecognized role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSet {
    pub can_view: Vec<Visibility>,
    pub can_upload: bool,
    pub can_tag: bool,
    pub can_share: Vec<Visibility>,
    pub can_delete: bool,
    pub can_manage_users: bool,
}

/// Per-user overrides layered on top of role defaults. Tag lists hold
/// normalized lowercase tags; user lists hold user ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAccess {
    #[serde(default)]
    pub allowed_tags: Vec<String>,
    #[serde(default)]
    pub denied_tags: Vec<String>,
    #[serde(default)]
    pub allowed_users: Vec<String>,
    #[serde(default)]
    pub restricted_users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissions {
    pub user_id: String,
    pub role: Role,
    pub permissions: PermissionSet,
    #[serde(default)]
    pub custom_access: CustomAccess,
}

impl UserPermissions {
    /// Default permission bundle for a role, with no custom overrides.
    pub fn for_role(user_id: impl Into<String>, role: Role) -> Self {
        let permissions = match role {
            Role::Admin => PermissionSet {
                can_view: vec![
                    Visibility::Public,
                    Visibility::Family,
                    Visibility::ExtendedFamily,
                    Visibility::Private,
                ],
                can_upload: true,
                can_tag: true,
                can_share: vec![
                    Visibility::Public,
                    Visibility::Family,
                    Visibility::ExtendedFamily,
                    Visibility::Private,
                ],
                can_delete: true,
                can_manage_users: true,
            },
            Role::Family => PermissionSet {
                can_view: vec![
                    Visibility::Public,
                    Visibility::Family,
                    Visibility::ExtendedFamily,
                ],
                can_upload: true,
                can_tag: true,
                can_share: vec![Visibility::Public, Visibility::Family],
                can_delete: false,
                can_manage_users: false,
            },
            Role::ExtendedFamily => PermissionSet {
                can_view: vec![Visibility::Public, Visibility::ExtendedFamily],
                can_upload: true,
                can_tag: true,
                can_share: vec![Visibility::Public],
                can_delete: false,
                can_manage_users: false,
            },
            Role::Friend => PermissionSet {
                can_view: vec![Visibility::Public],
                can_upload: false,
                can_tag: false,
                can_share: vec![],
                can_delete: false,
                can_manage_users: false,
            },
            Role::Guest => PermissionSet {
                can_view: vec![Visibility::Public],
                can_upload: false,
                can_tag: false,
                can_share: vec![],
                can_delete: false,
                can_manage_users: false,
            },
        };

        Self {
            user_id: user_id.into(),
            role,
            permissions,
            custom_access: CustomAccess::default(),
        }
    }

    pub fn can_view(&self, visibility: Visibility) -> bool {
        self.permissions.can_view.contains(&visibility)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str(" Extended-Family ").unwrap(), Role::ExtendedFamily);
        assert!(matches!(
            Role::from_str("superuser"),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_admin_views_everything() {
        let admin = UserPermissions::for_role("admin-1", Role::Admin);
        for vis in [
            Visibility::Public,
            Visibility::Family,
            Visibility::ExtendedFamily,
            Visibility::Private,
        ] {
            assert!(admin.can_view(vis));
        }
    }

    #[test]
    fn test_guest_sees_public_only() {
        let guest = UserPermissions::for_role("guest-1", Role::Guest);
        assert!(guest.can_view(Visibility::Public));
        assert!(!guest.can_view(Visibility::Family));
        assert!(!guest.permissions.can_upload);
    }
}
