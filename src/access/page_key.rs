use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Navigable sections of the dashboard. The set is closed and shared with the
/// backend's role-permissions endpoint, so keys must match the wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKey {
    Dashboard,
    Customers,
    Reception,
    Calendar,
    Treatments,
    Purchase,
    Inventory,
    Salary,
    Cashbook,
    Callcenter,
    Commission,
    Reports,
    Categories,
    Settings,
    Users,
}

impl PageKey {
    pub const ALL: [PageKey; 15] = [
        PageKey::Dashboard,
        PageKey::Customers,
        PageKey::Reception,
        PageKey::Calendar,
        PageKey::Treatments,
        PageKey::Purchase,
        PageKey::Inventory,
        PageKey::Salary,
        PageKey::Cashbook,
        PageKey::Callcenter,
        PageKey::Commission,
        PageKey::Reports,
        PageKey::Categories,
        PageKey::Settings,
        PageKey::Users,
    ];

    /// Keys that a permission map may grant. `Users` is admin-only.
    pub fn grantable() -> impl Iterator<Item = PageKey> {
        Self::ALL.into_iter().filter(|key| *key != PageKey::Users)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PageKey::Dashboard => "dashboard",
            PageKey::Customers => "customers",
            PageKey::Reception => "reception",
            PageKey::Calendar => "calendar",
            PageKey::Treatments => "treatments",
            PageKey::Purchase => "purchase",
            PageKey::Inventory => "inventory",
            PageKey::Salary => "salary",
            PageKey::Cashbook => "cashbook",
            PageKey::Callcenter => "callcenter",
            PageKey::Commission => "commission",
            PageKey::Reports => "reports",
            PageKey::Categories => "categories",
            PageKey::Settings => "settings",
            PageKey::Users => "users",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PageKey::Dashboard => "Tổng quan",
            PageKey::Customers => "Khách hàng",
            PageKey::Reception => "Công việc",
            PageKey::Calendar => "Lịch hẹn",
            PageKey::Treatments => "Labo",
            PageKey::Purchase => "Mua hàng",
            PageKey::Inventory => "Kho",
            PageKey::Salary => "Lương",
            PageKey::Cashbook => "Sổ quỹ",
            PageKey::Callcenter => "Tổng đài",
            PageKey::Commission => "Hoa hồng",
            PageKey::Reports => "Báo cáo",
            PageKey::Categories => "Danh mục",
            PageKey::Settings => "Cấu hình",
            PageKey::Users => "Người dùng",
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown page: {0}")]
pub struct UnknownPage(pub String);

impl FromStr for PageKey {
    type Err = UnknownPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or(UnknownPage(s.to_string()))
    }
}
