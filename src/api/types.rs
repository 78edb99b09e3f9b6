use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::calendar::Appointment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub permissions: Option<BTreeMap<String, bool>>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserRecord,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeResponse {
    pub user: UserRecord,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersResponse {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalendarResponse {
    #[serde(default)]
    pub doctors: Vec<String>,
    #[serde(default, deserialize_with = "valid_appointments")]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Envelope used by every paginated list endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppointmentRow {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub partner_id: Option<String>,
    #[serde(default)]
    pub partner_display_name: Option<String>,
    #[serde(default)]
    pub partner_phone: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerRow {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub treatment_status: Option<String>,
}

impl CustomerRow {
    pub fn shown_name(&self) -> String {
        let raw = self
            .display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.name.as_deref())
            .unwrap_or("");
        crate::calendar::strip_id_prefix(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Created {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or_else(|| match self.detail {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
            None => None,
        })
    }
}

/// Query parameters shared by the list endpoints. `filter` is sent as `state`
/// for appointments and `status` for customers.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub search: String,
    pub company: Option<String>,
    pub filter: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 15,
            search: String::new(),
            company: None,
            filter: None,
        }
    }
}

impl ListQuery {
    pub(crate) fn to_params(&self, filter_key: &'static str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.max(1).to_string()),
            ("per_page", self.per_page.clamp(1, 200).to_string()),
        ];
        if !self.search.trim().is_empty() {
            params.push(("search", self.search.trim().to_string()));
        }
        if let Some(company) = self.company.as_ref().filter(|c| !c.is_empty()) {
            params.push(("company", company.clone()));
        }
        if let Some(filter) = self.filter.as_ref().filter(|f| !f.is_empty()) {
            params.push((filter_key, filter.clone()));
        }
        params
    }
}

/// Drops rows that do not parse so one bad record cannot blank the whole day.
fn valid_appointments<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Appointment>, D::Error> {
    let rows = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<Appointment>(row) {
            Ok(appointment) => Some(appointment),
            Err(e) => {
                tracing::warn!("Skipping unreadable appointment row: {}", e);
                None
            }
        })
        .collect())
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected id, got {}", other))),
    }
}
