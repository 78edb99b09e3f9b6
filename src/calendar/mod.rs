pub mod appointment;
pub mod display_name;
pub mod layout;
pub mod list_view;
pub mod view_state;

pub use appointment::{Appointment, AppointmentState, DEFAULT_DURATION_MINUTES};
pub use display_name::strip_id_prefix;
pub use layout::{AppointmentCard, CalendarLayout, DoctorColumn, GridConfig, VisualClass};
pub use list_view::{build_list, ListEntry};
pub use view_state::{CalendarViewState, DisplayMode, ViewGranularity};
