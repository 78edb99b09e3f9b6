pub mod access;
pub mod api;
pub mod app;
pub mod calendar;
pub mod forms;
pub mod source;
pub mod storage;
pub mod ui;

pub use access::{can_access, filter_navigation, PageKey, Role, Session};
pub use app::{AppState, LoadStatus, LoadTicket, NavigationError};
pub use calendar::{Appointment, CalendarLayout, GridConfig};
