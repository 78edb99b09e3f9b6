use thiserror::Error;

use crate::access::{attempt_navigate, filter_navigation, AccessDenied, PageKey, Session};
use crate::calendar::{
    build_list, Appointment, AppointmentState, CalendarLayout, CalendarViewState, GridConfig,
    ListEntry,
};
use crate::source::{CalendarDay, SourceError};
use crate::ui::theme::Theme;

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Please sign in first")]
    NotSignedIn,
    #[error(transparent)]
    Denied(#[from] AccessDenied),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Identifies one issued calendar fetch. Only the latest ticket may write its
/// result into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Help,
    Search,
}

pub struct AppState {
    pub session: Option<Session>,
    pub current_page: PageKey,
    pub default_page: PageKey,
    pub sidebar_index: usize,
    pub calendar: CalendarViewState,
    pub calendar_day: Option<CalendarDay>,
    pub layout: Option<CalendarLayout>,
    pub list: Vec<ListEntry>,
    pub grid: GridConfig,
    pub load_status: LoadStatus,
    pub status_message: Option<String>,
    pub overlay: Option<Overlay>,
    pub selected_card: usize,
    pub theme: Theme,
    issued_loads: u64,
    active_load: Option<LoadTicket>,
}

impl AppState {
    pub fn new(grid: GridConfig) -> Self {
        Self {
            session: None,
            current_page: PageKey::Dashboard,
            default_page: PageKey::Dashboard,
            sidebar_index: 0,
            calendar: CalendarViewState::default(),
            calendar_day: None,
            layout: None,
            list: Vec::new(),
            grid,
            load_status: LoadStatus::Idle,
            status_message: None,
            overlay: None,
            selected_card: 0,
            theme: Theme::default(),
            issued_loads: 0,
            active_load: None,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_default_page(mut self, page: PageKey) -> Self {
        self.default_page = page;
        self
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Installs the session and lands on the configured default page, or the
    /// first page the user may see when the default is not granted.
    pub fn sign_in(&mut self, session: Session) {
        tracing::info!("Session started for {} ({})", session.email, session.role.as_str());
        self.session = Some(session);
        self.status_message = None;
        self.overlay = None;

        let visible = self.visible_pages();
        self.current_page = if visible.contains(&self.default_page) {
            self.default_page
        } else {
            visible.first().copied().unwrap_or(PageKey::Dashboard)
        };
        self.sidebar_index = visible
            .iter()
            .position(|p| *p == self.current_page)
            .unwrap_or(0);
    }

    pub fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!("Session ended for {}", session.email);
        }
        self.calendar_day = None;
        self.layout = None;
        self.list.clear();
        self.overlay = None;
        self.active_load = None;
        self.load_status = LoadStatus::Idle;
        self.selected_card = 0;
    }

    /// Called whenever the backend rejects the token.
    pub fn handle_unauthorized(&mut self) {
        tracing::warn!("Backend rejected the session token; returning to login");
        self.sign_out();
        self.status_message = Some("Phiên đăng nhập đã hết hạn, vui lòng đăng nhập lại".to_string());
    }

    pub fn visible_pages(&self) -> Vec<PageKey> {
        match &self.session {
            Some(session) => filter_navigation(session, &PageKey::ALL),
            None => Vec::new(),
        }
    }

    pub fn navigate(&mut self, page: PageKey) -> Result<(), NavigationError> {
        let session = self.session.as_ref().ok_or(NavigationError::NotSignedIn)?;

        if let Err(denied) = attempt_navigate(session, page) {
            self.status_message = Some(denied.to_string());
            return Err(denied.into());
        }

        tracing::info!("Navigating to {}", page);
        self.current_page = page;
        self.overlay = None;
        self.status_message = None;
        if let Some(index) = self.visible_pages().iter().position(|p| *p == page) {
            self.sidebar_index = index;
        }
        Ok(())
    }

    pub fn move_sidebar(&mut self, delta: i32) {
        let count = self.visible_pages().len();
        if count == 0 {
            return;
        }
        let next = self.sidebar_index as i64 + delta as i64;
        self.sidebar_index = next.clamp(0, count as i64 - 1) as usize;
    }

    pub fn sidebar_page(&self) -> Option<PageKey> {
        self.visible_pages().get(self.sidebar_index).copied()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued_loads += 1;
        let ticket = LoadTicket(self.issued_loads);
        self.active_load = Some(ticket);
        self.load_status = LoadStatus::Loading;
        ticket
    }

    fn accepts(&self, ticket: LoadTicket) -> bool {
        self.active_load == Some(ticket) && self.current_page == PageKey::Calendar
    }

    /// Applies a fetched day. Returns `false` when the result belongs to a
    /// superseded fetch or the user already left the calendar.
    pub fn complete_load(&mut self, ticket: LoadTicket, day: CalendarDay) -> bool {
        if !self.accepts(ticket) {
            tracing::debug!("Dropping stale calendar result {:?} for {}", ticket, day.date);
            return false;
        }

        self.active_load = None;
        self.load_status = LoadStatus::Ready;
        if day.is_fixture() {
            self.status_message = Some("Không kết nối được máy chủ, đang hiển thị dữ liệu mẫu".to_string());
        }
        self.calendar_day = Some(day);
        self.selected_card = 0;
        self.rebuild_layout();
        true
    }

    pub fn fail_load(&mut self, ticket: LoadTicket, err: &SourceError) -> bool {
        if !self.accepts(ticket) {
            tracing::debug!("Dropping stale calendar failure {:?}: {}", ticket, err);
            return false;
        }

        self.active_load = None;
        match err {
            SourceError::Unauthorized => self.handle_unauthorized(),
            other => {
                tracing::error!("Calendar load failed: {}", other);
                self.load_status = LoadStatus::Failed(other.to_string());
                self.status_message = Some(other.to_string());
            }
        }
        true
    }

    pub fn rebuild_layout(&mut self) {
        let Some(day) = &self.calendar_day else {
            self.layout = None;
            self.list.clear();
            return;
        };

        let mut layout = CalendarLayout::build(&day.doctors, &day.appointments, &self.grid);
        layout.apply_search(&self.calendar.search_filter);
        self.list = build_list(&day.appointments, &self.grid.placeholder_doctor);
        self.layout = Some(layout);
        self.selected_card = self.selected_card.min(self.card_ids().len().saturating_sub(1));
    }

    pub fn set_search(&mut self, query: &str) {
        self.calendar.set_search(query);
        if let Some(layout) = self.layout.as_mut() {
            layout.apply_search(query);
        }
    }

    /// Cards in reading order: by start offset, then by column.
    pub fn card_ids(&self) -> Vec<String> {
        let Some(layout) = &self.layout else {
            return Vec::new();
        };
        let mut cards: Vec<(f64, usize, &str)> = layout
            .columns
            .iter()
            .enumerate()
            .flat_map(|(col, column)| {
                column
                    .cards
                    .iter()
                    .map(move |card| (card.top, col, card.appointment_id.as_str()))
            })
            .collect();
        cards.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        cards.into_iter().map(|(_, _, id)| id.to_string()).collect()
    }

    pub fn move_card_selection(&mut self, delta: i32) {
        let count = self.card_ids().len();
        if count == 0 {
            self.selected_card = 0;
            return;
        }
        let next = self.selected_card as i64 + delta as i64;
        self.selected_card = next.clamp(0, count as i64 - 1) as usize;
    }

    pub fn selected_appointment(&self) -> Option<&Appointment> {
        let id = self.card_ids().get(self.selected_card)?.clone();
        self.calendar_day
            .as_ref()?
            .appointments
            .iter()
            .find(|a| a.id == id)
    }

    /// Fixture data is display-only.
    pub fn can_edit_calendar(&self) -> bool {
        self.calendar_day
            .as_ref()
            .map(|day| !day.is_fixture())
            .unwrap_or(false)
    }

    /// The next state for the selected appointment, or `None` with a status
    /// message when editing is not possible.
    pub fn next_state_for_selected(&mut self) -> Option<(String, AppointmentState)> {
        if !self.can_edit_calendar() {
            self.status_message = Some("Dữ liệu mẫu, không thể cập nhật".to_string());
            return None;
        }
        let appointment = self.selected_appointment()?;
        Some((appointment.id.clone(), appointment.state.next_selectable()))
    }

    pub fn apply_state_change(&mut self, appointment_id: &str, state: AppointmentState) {
        let Some(day) = self.calendar_day.as_mut() else {
            return;
        };
        if let Some(appointment) = day.appointments.iter_mut().find(|a| a.id == appointment_id) {
            appointment.state = state;
        }
        self.rebuild_layout();
    }

    pub fn toggle_help(&mut self) {
        self.overlay = match self.overlay {
            Some(Overlay::Help) => None,
            _ => Some(Overlay::Help),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{DenialReason, Role};
    use crate::source::{DataOrigin, FixtureCalendarSource};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn create_test_session(role: Role, granted: &[PageKey]) -> Session {
        Session {
            user_id: "u_1".to_string(),
            name: "Lan".to_string(),
            email: "lan@clinic.vn".to_string(),
            role,
            permissions: granted.iter().map(|p| (*p, true)).collect::<BTreeMap<_, _>>(),
            active: true,
        }
    }

    fn viewer_app() -> AppState {
        let mut app = AppState::new(GridConfig::default());
        app.sign_in(create_test_session(
            Role::Viewer,
            &[PageKey::Dashboard, PageKey::Customers, PageKey::Calendar],
        ));
        app
    }

    fn live_day() -> CalendarDay {
        let mut day = FixtureCalendarSource::day(date(2025, 1, 15));
        day.origin = DataOrigin::Live;
        day
    }

    #[test]
    fn new_app_is_signed_out() {
        let app = AppState::new(GridConfig::default());
        assert!(!app.is_signed_in());
        assert!(app.visible_pages().is_empty());
    }

    #[test]
    fn navigate_without_session_is_rejected() {
        let mut app = AppState::new(GridConfig::default());
        assert!(matches!(app.navigate(PageKey::Calendar), Err(NavigationError::NotSignedIn)));
    }

    #[test]
    fn sign_in_lands_on_first_visible_page_when_default_is_denied() {
        let mut app = AppState::new(GridConfig::default()).with_default_page(PageKey::Reports);
        app.sign_in(create_test_session(Role::Viewer, &[PageKey::Customers, PageKey::Calendar]));

        assert_eq!(app.current_page, PageKey::Customers);
        assert_eq!(app.sidebar_index, 0);
    }

    #[test]
    fn denied_navigation_keeps_page_and_overlay() {
        let mut app = viewer_app();
        app.navigate(PageKey::Customers).unwrap();
        app.overlay = Some(Overlay::Help);

        let err = app.navigate(PageKey::Reports).unwrap_err();

        assert!(matches!(err, NavigationError::Denied(AccessDenied { reason: DenialReason::NotPermitted, .. })));
        assert_eq!(app.current_page, PageKey::Customers);
        assert_eq!(app.overlay, Some(Overlay::Help));
        assert_eq!(app.status_message.as_deref(), Some("Bạn không có quyền truy cập trang này"));
    }

    #[test]
    fn viewer_cannot_open_users_page() {
        let mut app = viewer_app();
        let err = app.navigate(PageKey::Users).unwrap_err();
        assert!(matches!(err, NavigationError::Denied(AccessDenied { reason: DenialReason::AdminOnly, .. })));
    }

    #[test]
    fn admin_sees_every_page() {
        let mut app = AppState::new(GridConfig::default());
        app.sign_in(create_test_session(Role::Admin, &[]));

        assert_eq!(app.visible_pages(), PageKey::ALL.to_vec());
        assert!(app.navigate(PageKey::Users).is_ok());
    }

    #[test]
    fn successful_navigation_closes_overlay() {
        let mut app = viewer_app();
        app.overlay = Some(Overlay::Help);

        app.navigate(PageKey::Calendar).unwrap();

        assert_eq!(app.current_page, PageKey::Calendar);
        assert_eq!(app.overlay, None);
        assert_eq!(app.sidebar_index, 2);
    }

    #[test]
    fn completed_load_builds_layout() {
        let mut app = viewer_app();
        app.navigate(PageKey::Calendar).unwrap();

        let ticket = app.begin_load();
        assert_eq!(app.load_status, LoadStatus::Loading);
        assert!(app.complete_load(ticket, live_day()));

        assert_eq!(app.load_status, LoadStatus::Ready);
        assert_eq!(app.layout.as_ref().unwrap().appointment_count, 4);
        assert_eq!(app.list.len(), 4);
        assert!(app.can_edit_calendar());
    }

    #[test]
    fn superseded_load_is_discarded() {
        let mut app = viewer_app();
        app.navigate(PageKey::Calendar).unwrap();

        let first = app.begin_load();
        let second = app.begin_load();

        let mut stale = live_day();
        stale.date = date(2025, 1, 14);
        assert!(app.complete_load(second, live_day()));
        assert!(!app.complete_load(first, stale));

        assert_eq!(app.calendar_day.as_ref().unwrap().date, date(2025, 1, 15));
    }

    #[test]
    fn load_finishing_after_leaving_calendar_is_discarded() {
        let mut app = viewer_app();
        app.navigate(PageKey::Calendar).unwrap();
        let ticket = app.begin_load();

        app.navigate(PageKey::Customers).unwrap();

        assert!(!app.complete_load(ticket, live_day()));
        assert!(app.calendar_day.is_none());
    }

    #[test]
    fn unauthorized_load_signs_out() {
        let mut app = viewer_app();
        app.navigate(PageKey::Calendar).unwrap();
        let ticket = app.begin_load();

        assert!(app.fail_load(ticket, &SourceError::Unauthorized));

        assert!(!app.is_signed_in());
        assert!(app.status_message.is_some());
    }

    #[test]
    fn fixture_day_is_read_only() {
        let mut app = viewer_app();
        app.navigate(PageKey::Calendar).unwrap();
        let ticket = app.begin_load();
        app.complete_load(ticket, FixtureCalendarSource::day(date(2025, 1, 15)));

        assert!(!app.can_edit_calendar());
        assert_eq!(app.next_state_for_selected(), None);
        assert_eq!(app.status_message.as_deref(), Some("Dữ liệu mẫu, không thể cập nhật"));
    }

    #[test]
    fn cards_are_selected_in_time_order() {
        let mut app = viewer_app();
        app.navigate(PageKey::Calendar).unwrap();
        let ticket = app.begin_load();
        app.complete_load(ticket, live_day());

        assert_eq!(app.selected_appointment().unwrap().partner_display_name, "Nguyễn Văn An");
        app.move_card_selection(1);
        assert_eq!(app.selected_appointment().unwrap().partner_display_name, "Phạm Thị Mai");
        app.move_card_selection(10);
        assert_eq!(app.selected_appointment().unwrap().partner_display_name, "Lê Thị Hương");
    }

    #[test]
    fn state_change_updates_card() {
        let mut app = viewer_app();
        app.navigate(PageKey::Calendar).unwrap();
        let ticket = app.begin_load();
        app.complete_load(ticket, live_day());

        let (id, next) = app.next_state_for_selected().unwrap();
        assert_eq!(next, AppointmentState::Waiting);
        app.apply_state_change(&id, next.clone());

        let card = app.layout.as_ref().unwrap().find_card(&id).unwrap();
        assert_eq!(card.state, next);
    }

    #[test]
    fn search_dims_non_matching_cards() {
        let mut app = viewer_app();
        app.navigate(PageKey::Calendar).unwrap();
        let ticket = app.begin_load();
        app.complete_load(ticket, live_day());

        app.set_search("0977");

        let dimmed = app.layout.as_ref().unwrap().cards().filter(|c| c.dimmed).count();
        assert_eq!(dimmed, 3);
    }
}
