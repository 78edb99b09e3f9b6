use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::calendar::{Appointment, AppointmentState};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Session expired, please sign in again")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Calendar unavailable: {0}")]
    Unavailable(String),
}

impl From<ApiError> for SourceError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => SourceError::Unauthorized,
            ApiError::Forbidden(message) => SourceError::Forbidden(message),
            other => SourceError::Unavailable(other.to_string()),
        }
    }
}

impl SourceError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Live,
    Fixture,
}

/// One day of calendar data together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub doctors: Vec<String>,
    pub appointments: Vec<Appointment>,
    pub origin: DataOrigin,
}

impl CalendarDay {
    pub fn is_fixture(&self) -> bool {
        self.origin == DataOrigin::Fixture
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn load_day(&self, date: NaiveDate, company: Option<String>) -> Result<CalendarDay, SourceError>;
}

pub struct LiveCalendarSource {
    client: ApiClient,
}

impl LiveCalendarSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CalendarSource for LiveCalendarSource {
    async fn load_day(&self, date: NaiveDate, company: Option<String>) -> Result<CalendarDay, SourceError> {
        let response = self.client.calendar_day(date, company.as_deref()).await?;

        // The roster comes back sorted; keep only names that are actually set.
        let doctors = response
            .doctors
            .into_iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();

        Ok(CalendarDay {
            date,
            doctors,
            appointments: response.appointments,
            origin: DataOrigin::Live,
        })
    }
}

/// Fixed illustrative day shown when the backend cannot be reached.
pub struct FixtureCalendarSource;

impl FixtureCalendarSource {
    pub const DOCTORS: [&'static str; 3] = ["BS. Trần Thị B", "BS. Nguyễn Văn A", "BS. Lê Văn C"];

    pub fn day(date: NaiveDate) -> CalendarDay {
        let rows = [
            ("Nguyễn Văn An", "0988123456", Self::DOCTORS[0], (8, 30), 60, "confirmed", "0", "Nhổ răng khôn"),
            ("Phạm Thị Mai", "0977123456", Self::DOCTORS[1], (9, 0), 45, "done", "0", "Tẩy trắng"),
            ("Trần Văn Bình", "0966123456", Self::DOCTORS[2], (10, 0), 90, "confirmed", "3", "Chỉnh nha"),
            ("Lê Thị Hương", "0911223344", Self::DOCTORS[0], (14, 0), 30, "cancel", "1", "Hủy hẹn"),
        ];

        let appointments = rows
            .into_iter()
            .filter_map(|(name, phone, doctor, (hour, minute), duration, state, color, note)| {
                let start: NaiveDateTime = date.and_hms_opt(hour, minute, 0)?;
                Some(Appointment {
                    id: format!("sample-{}", uuid::Uuid::new_v4()),
                    partner_id: None,
                    partner_display_name: name.to_string(),
                    partner_phone: phone.to_string(),
                    date: start,
                    duration_minutes: duration,
                    doctor: Some(doctor.to_string()),
                    doctor_name: Some(doctor.to_string()),
                    state: AppointmentState::from_wire(state),
                    color_tag: color.to_string(),
                    note: Some(note.to_string()),
                    reason: None,
                })
            })
            .collect();

        CalendarDay {
            date,
            doctors: Self::DOCTORS.iter().map(|d| d.to_string()).collect(),
            appointments,
            origin: DataOrigin::Fixture,
        }
    }
}

#[async_trait]
impl CalendarSource for FixtureCalendarSource {
    async fn load_day(&self, date: NaiveDate, _company: Option<String>) -> Result<CalendarDay, SourceError> {
        Ok(Self::day(date))
    }
}

/// Serves the primary source and substitutes the fixture day when it fails
/// for reasons other than authentication.
pub struct FallbackCalendarSource<P> {
    primary: P,
    enabled: bool,
}

impl<P: CalendarSource> FallbackCalendarSource<P> {
    pub fn new(primary: P) -> Self {
        Self { primary, enabled: true }
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[async_trait]
impl<P: CalendarSource> CalendarSource for FallbackCalendarSource<P> {
    async fn load_day(&self, date: NaiveDate, company: Option<String>) -> Result<CalendarDay, SourceError> {
        match self.primary.load_day(date, company).await {
            Ok(day) => Ok(day),
            Err(err) if self.enabled && err.is_recoverable() => {
                tracing::warn!("Calendar fetch for {} failed, showing sample data: {}", date, err);
                Ok(FixtureCalendarSource::day(date))
            }
            Err(err) => Err(err),
        }
    }
}
