use thiserror::Error;

use crate::access::{PageKey, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    AdminOnly,
    NotPermitted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", denial_message(.reason))]
pub struct AccessDenied {
    pub page: PageKey,
    pub reason: DenialReason,
}

fn denial_message(reason: &DenialReason) -> &'static str {
    match reason {
        DenialReason::AdminOnly => "Chỉ Admin mới có quyền quản lý người dùng",
        DenialReason::NotPermitted => "Bạn không có quyền truy cập trang này",
    }
}

/// Single entry point for page access. Admins see everything; everyone else
/// needs an explicit `true` in their permission map and never reaches `users`.
pub fn can_access(session: &Session, page: PageKey) -> bool {
    if session.is_admin() {
        return true;
    }
    page != PageKey::Users && session.permissions.get(&page).copied().unwrap_or(false)
}

/// Pages that should appear in navigation at all; denied pages are hidden
/// rather than shown disabled.
pub fn filter_navigation(session: &Session, pages: &[PageKey]) -> Vec<PageKey> {
    pages
        .iter()
        .copied()
        .filter(|page| can_access(session, *page))
        .collect()
}

pub fn attempt_navigate(session: &Session, page: PageKey) -> Result<(), AccessDenied> {
    if can_access(session, page) {
        return Ok(());
    }

    let reason = if page == PageKey::Users {
        DenialReason::AdminOnly
    } else {
        DenialReason::NotPermitted
    };
    tracing::warn!("Navigation to '{}' denied for {}", page, session.email);
    Err(AccessDenied { page, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn session(role: Role, granted: &[(PageKey, bool)]) -> Session {
        Session {
            user_id: "u_test".to_string(),
            name: "Test".to_string(),
            email: "test@clinic.vn".to_string(),
            role,
            permissions: granted.iter().copied().collect(),
            active: true,
        }
    }

    fn page_key() -> impl Strategy<Value = PageKey> {
        (0..PageKey::ALL.len()).prop_map(|i| PageKey::ALL[i])
    }

    fn permission_map() -> impl Strategy<Value = BTreeMap<PageKey, bool>> {
        proptest::collection::btree_map(page_key(), any::<bool>(), 0..15)
    }

    proptest! {
        #[test]
        fn admin_can_access_every_page(perms in permission_map(), page in page_key()) {
            let mut s = session(Role::Admin, &[]);
            s.permissions = perms;
            prop_assert!(can_access(&s, page));
        }

        #[test]
        fn viewer_access_matches_permission_map(perms in permission_map(), page in page_key()) {
            let mut s = session(Role::Viewer, &[]);
            s.permissions = perms.clone();
            let expected = page != PageKey::Users && perms.get(&page).copied().unwrap_or(false);
            prop_assert_eq!(can_access(&s, page), expected);
        }
    }

    #[test]
    fn viewer_cannot_reach_users_even_when_granted() {
        let s = session(Role::Viewer, &[(PageKey::Users, true)]);
        assert!(!can_access(&s, PageKey::Users));
    }

    #[test]
    fn absent_permission_is_denied() {
        let s = session(Role::Viewer, &[(PageKey::Calendar, true)]);
        assert!(!can_access(&s, PageKey::Salary));
    }

    #[test]
    fn filter_navigation_hides_denied_pages_in_order() {
        let s = session(
            Role::Viewer,
            &[(PageKey::Calendar, true), (PageKey::Dashboard, true), (PageKey::Reports, false)],
        );

        let visible = filter_navigation(&s, &PageKey::ALL);

        assert_eq!(visible, vec![PageKey::Dashboard, PageKey::Calendar]);
    }

    #[test]
    fn filter_navigation_shows_users_to_admin() {
        let s = session(Role::Admin, &[]);
        let visible = filter_navigation(&s, &PageKey::ALL);
        assert_eq!(visible.len(), PageKey::ALL.len());
        assert_eq!(visible.last(), Some(&PageKey::Users));
    }

    #[test]
    fn users_denial_reports_admin_only() {
        let s = session(Role::Viewer, &[]);
        let err = attempt_navigate(&s, PageKey::Users).unwrap_err();
        assert_eq!(err.reason, DenialReason::AdminOnly);
        assert_eq!(err.to_string(), "Chỉ Admin mới có quyền quản lý người dùng");
    }

    #[test]
    fn ordinary_denial_reports_not_permitted() {
        let s = session(Role::Viewer, &[]);
        let err = attempt_navigate(&s, PageKey::Cashbook).unwrap_err();
        assert_eq!(err.page, PageKey::Cashbook);
        assert_eq!(err.reason, DenialReason::NotPermitted);
    }

    #[test]
    fn granted_navigation_succeeds() {
        let s = session(Role::Viewer, &[(PageKey::Customers, true)]);
        assert_eq!(attempt_navigate(&s, PageKey::Customers), Ok(()));
    }
}
