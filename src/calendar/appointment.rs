use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_DURATION_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AppointmentState {
    #[default]
    Confirmed,
    Done,
    Cancel,
    Draft,
    Waiting,
    Examination,
    Other(String),
}

impl AppointmentState {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "confirmed" => AppointmentState::Confirmed,
            "done" => AppointmentState::Done,
            "cancel" => AppointmentState::Cancel,
            "draft" => AppointmentState::Draft,
            "waiting" => AppointmentState::Waiting,
            "examination" => AppointmentState::Examination,
            other => AppointmentState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AppointmentState::Confirmed => "confirmed",
            AppointmentState::Done => "done",
            AppointmentState::Cancel => "cancel",
            AppointmentState::Draft => "draft",
            AppointmentState::Waiting => "waiting",
            AppointmentState::Examination => "examination",
            AppointmentState::Other(value) => value,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            AppointmentState::Confirmed => "Đang hẹn",
            AppointmentState::Done => "Hoàn thành",
            AppointmentState::Cancel => "Hủy hẹn",
            AppointmentState::Draft => "Nháp",
            AppointmentState::Waiting => "Chờ khám",
            AppointmentState::Examination => "Đang khám",
            AppointmentState::Other(value) => value,
        }
    }

    /// States offered by the status picker, in picker order.
    pub fn selectable() -> [AppointmentState; 5] {
        [
            AppointmentState::Confirmed,
            AppointmentState::Waiting,
            AppointmentState::Examination,
            AppointmentState::Done,
            AppointmentState::Cancel,
        ]
    }

    pub fn next_selectable(&self) -> AppointmentState {
        let options = Self::selectable();
        let position = options.iter().position(|state| state == self);
        match position {
            Some(i) => options[(i + 1) % options.len()].clone(),
            None => options[0].clone(),
        }
    }
}

impl Serialize for AppointmentState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppointmentState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value
            .map(|v| AppointmentState::from_wire(&v))
            .unwrap_or_default())
    }
}

/// An appointment as returned by `/api/appointments/calendar`. Only the fields
/// the calendar needs are kept; the rest of the backend row is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default)]
    pub partner_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub partner_display_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub partner_phone: String,
    #[serde(deserialize_with = "local_timestamp")]
    pub date: NaiveDateTime,
    #[serde(default = "default_duration", deserialize_with = "duration_or_default")]
    pub duration_minutes: u32,
    #[serde(default, rename = "calendar_doctor")]
    pub doctor: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub state: AppointmentState,
    #[serde(default, rename = "color", deserialize_with = "lenient_string")]
    pub color_tag: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Appointment {
    pub fn hour(&self) -> u32 {
        self.date.hour()
    }

    pub fn minute(&self) -> u32 {
        self.date.minute()
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    /// Note if present, otherwise the booking reason.
    pub fn remark(&self) -> &str {
        [self.note.as_deref(), self.reason.as_deref()]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
            .unwrap_or("")
    }

    /// Calendar doctor, then the assigned doctor; `None` when the record
    /// references no doctor at all.
    pub fn doctor_label(&self) -> Option<&str> {
        [self.doctor.as_deref(), self.doctor_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
    }
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

fn duration_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let minutes = match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|m| u32::try_from(m).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    Ok(minutes.filter(|m| *m > 0).unwrap_or(DEFAULT_DURATION_MINUTES))
}

/// Accepts strings, numbers and null; the backend is not consistent about
/// which it sends for ids and color codes.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Appointment timestamps are wall-clock times at the clinic. Offsets, when
/// present, are dropped rather than converted.
pub fn parse_local_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn local_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_local_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid appointment date '{}'", raw)))
}
