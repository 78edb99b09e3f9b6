use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::access::PageKey;
use crate::api::UserRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
}

impl Role {
    /// The backend coerces anything that is not `admin` to `viewer`; mirror that
    /// so an unexpected value never widens access.
    pub fn from_wire(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Viewer
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Viewer => "viewer",
        }
    }
}

/// The signed-in user as the client sees it. Permissions are a snapshot taken at
/// login or at the last `/api/auth/me` refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub permissions: BTreeMap<PageKey, bool>,
    pub active: bool,
}

impl Session {
    pub fn from_user(user: &UserRecord) -> Self {
        let mut permissions = BTreeMap::new();
        for (key, granted) in user.permissions.iter().flatten() {
            match key.parse::<PageKey>() {
                Ok(page) => {
                    permissions.insert(page, *granted);
                }
                Err(_) => tracing::debug!("Ignoring permission for unknown page '{}'", key),
            }
        }

        Self {
            user_id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: Role::from_wire(&user.role),
            permissions,
            active: user.active.unwrap_or(true),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.email.is_empty() {
            &self.email
        } else {
            "User"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user(role: &str, permissions: Option<Vec<(&str, bool)>>) -> UserRecord {
        UserRecord {
            id: "u_1".to_string(),
            name: "Lan".to_string(),
            email: "lan@clinic.vn".to_string(),
            role: role.to_string(),
            permissions: permissions.map(|entries| {
                entries
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect()
            }),
            active: None,
            created_at: None,
        }
    }

    #[test]
    fn unknown_role_falls_back_to_viewer() {
        assert_eq!(Role::from_wire("superuser"), Role::Viewer);
        assert_eq!(Role::from_wire("ADMIN"), Role::Admin);
    }

    #[test]
    fn session_keeps_known_permission_keys_only() {
        let record = user(
            "viewer",
            Some(vec![("calendar", true), ("locations", true), ("salary", false)]),
        );

        let session = Session::from_user(&record);

        assert_eq!(session.permissions.len(), 2);
        assert_eq!(session.permissions.get(&PageKey::Calendar), Some(&true));
        assert_eq!(session.permissions.get(&PageKey::Salary), Some(&false));
    }

    #[test]
    fn missing_permissions_yield_empty_map() {
        let session = Session::from_user(&user("viewer", None));
        assert!(session.permissions.is_empty());
    }

    #[test]
    fn missing_active_flag_defaults_to_active() {
        let session = Session::from_user(&user("admin", None));
        assert!(session.active);
        assert!(session.is_admin());
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let mut record = user("viewer", None);
        record.name.clear();
        let session = Session::from_user(&record);
        assert_eq!(session.display_name(), "lan@clinic.vn");
    }
}
