pub mod gate;
pub mod page_key;
pub mod role_templates;
pub mod session;

pub use gate::{attempt_navigate, can_access, filter_navigation, AccessDenied, DenialReason};
pub use page_key::PageKey;
pub use role_templates::RoleTemplates;
pub use session::{Role, Session};
