use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::access::{PageKey, Role};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn required(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

fn require(value: &str, field: &'static str, message: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::required(field, message))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl NewCustomer {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.name, "name", "Vui lòng nhập họ tên")
    }
}

/// The backend takes date and time in one `"YYYY-MM-DD HH:MM"` string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewAppointment {
    pub partner_id: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
    pub state: String,
}

impl NewAppointment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.partner_id, "partner_id", "Vui lòng chọn khách hàng")?;
        require(&self.date, "date", "Vui lòng chọn ngày hẹn")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppointmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
}

impl AppointmentUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let empty = self.state.is_none()
            && self.note.is_none()
            && self.reason.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.doctor_id.is_none();
        if empty {
            return Err(ValidationError::required("appointment", "Không có dữ liệu cập nhật"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateChange {
    pub state: String,
}

impl StateChange {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.state, "state", "Thiếu trạng thái mới")
    }
}

/// User create/update payload. On update, `password` may be left empty to keep
/// the current one and `permissions` is only sent when the role changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeMap<PageKey, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl UserForm {
    pub fn validate(&self, creating: bool) -> Result<(), ValidationError> {
        require(&self.name, "name", "Vui lòng nhập tên")?;
        require(&self.email, "email", "Vui lòng nhập email")?;
        if creating {
            require(&self.password, "password", "Vui lòng nhập mật khẩu")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(ValidationError::required(
                "credentials",
                "Vui lòng nhập email và mật khẩu",
            ));
        }
        Ok(())
    }
}
