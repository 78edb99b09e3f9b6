pub mod client;
pub mod types;

pub use client::{ApiClient, ApiError};
pub use types::{
    AppointmentRow, CalendarResponse, Created, CustomerRow, ListQuery, LoginResponse, Page,
    UserRecord,
};
