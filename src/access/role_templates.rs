use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::access::{PageKey, Role};
use crate::api::UserRecord;

/// Per-role default permission sets. Admin always gets every grantable page;
/// the viewer set is configured by an admin and stored on the backend by
/// rewriting every viewer's permission map.
///
/// Changing the template does not touch sessions that are already signed in.
/// They pick up the new map on the next `/api/auth/me` refresh or login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTemplates {
    pub viewer: Vec<PageKey>,
}

impl Default for RoleTemplates {
    fn default() -> Self {
        Self {
            viewer: vec![PageKey::Dashboard, PageKey::Customers, PageKey::Calendar],
        }
    }
}

impl RoleTemplates {
    pub fn new(viewer: impl IntoIterator<Item = PageKey>) -> Self {
        let mut viewer: Vec<PageKey> = viewer
            .into_iter()
            .filter(|key| *key != PageKey::Users)
            .collect();
        viewer.sort();
        viewer.dedup();
        Self { viewer }
    }

    pub fn pages_for(&self, role: Role) -> Vec<PageKey> {
        match role {
            Role::Admin => PageKey::grantable().collect(),
            Role::Viewer => self.viewer.clone(),
        }
    }

    /// Full permission map over every grantable page, as sent when a user is
    /// created or moved to another role.
    pub fn permissions_for(&self, role: Role) -> BTreeMap<PageKey, bool> {
        let granted = self.pages_for(role);
        PageKey::grantable()
            .map(|key| (key, granted.contains(&key)))
            .collect()
    }

    /// The viewer template as the backend currently applies it: the granted
    /// keys of the first viewer that has any.
    pub fn infer_from_users(users: &[UserRecord]) -> Option<Self> {
        users
            .iter()
            .filter(|user| Role::from_wire(&user.role) == Role::Viewer)
            .find_map(|user| {
                let granted: Vec<PageKey> = user
                    .permissions
                    .iter()
                    .flatten()
                    .filter(|(_, granted)| **granted)
                    .filter_map(|(key, _)| key.parse::<PageKey>().ok())
                    .collect();
                (!granted.is_empty()).then(|| Self::new(granted))
            })
    }

    /// Resolution order: live user list, locally cached template, built-in default.
    pub fn resolve(users: &[UserRecord], cached: Option<RoleTemplates>) -> Self {
        Self::infer_from_users(users)
            .or(cached)
            .unwrap_or_default()
    }

    pub fn viewer_wire_keys(&self) -> Vec<String> {
        self.viewer.iter().map(|key| key.as_str().to_string()).collect()
    }
}
