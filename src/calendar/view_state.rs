use chrono::{Datelike, Days, Local, Months, NaiveDate};

const WEEKDAY_NAMES: [&str; 7] = [
    "Thứ Hai",
    "Thứ Ba",
    "Thứ Tư",
    "Thứ Năm",
    "Thứ Sáu",
    "Thứ Bảy",
    "Chủ Nhật",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewGranularity {
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Grid,
    List,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarViewState {
    pub selected_date: NaiveDate,
    pub granularity: ViewGranularity,
    pub display_mode: DisplayMode,
    pub search_filter: String,
}

impl CalendarViewState {
    pub fn new(selected_date: NaiveDate) -> Self {
        Self {
            selected_date,
            granularity: ViewGranularity::Day,
            display_mode: DisplayMode::Grid,
            search_filter: String::new(),
        }
    }

    /// Moves one period forward (`direction > 0`) or backward. Month steps clamp
    /// to the last day of shorter months.
    pub fn navigate(&mut self, direction: i32) {
        let forward = direction >= 0;
        let date = self.selected_date;
        let moved = match self.granularity {
            ViewGranularity::Day => step_days(date, 1, forward),
            ViewGranularity::Week => step_days(date, 7, forward),
            ViewGranularity::Month if forward => date.checked_add_months(Months::new(1)),
            ViewGranularity::Month => date.checked_sub_months(Months::new(1)),
        };
        self.selected_date = moved.unwrap_or(date);
    }

    pub fn go_to_today(&mut self) {
        self.selected_date = Local::now().date_naive();
    }

    pub fn go_to(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    pub fn set_granularity(&mut self, granularity: ViewGranularity) {
        self.granularity = granularity;
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
    }

    pub fn toggle_display_mode(&mut self) {
        self.display_mode = match self.display_mode {
            DisplayMode::Grid => DisplayMode::List,
            DisplayMode::List => DisplayMode::Grid,
        };
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search_filter = query.into();
    }

    pub fn api_date(&self) -> String {
        self.selected_date.format("%Y-%m-%d").to_string()
    }

    pub fn date_label(&self) -> String {
        let weekday = WEEKDAY_NAMES[self.selected_date.weekday().num_days_from_monday() as usize];
        format!("{} - {}", weekday, self.selected_date.format("%d/%m/%Y"))
    }
}

impl Default for CalendarViewState {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

fn step_days(date: NaiveDate, days: u64, forward: bool) -> Option<NaiveDate> {
    if forward {
        date.checked_add_days(Days::new(days))
    } else {
        date.checked_sub_days(Days::new(days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn defaults_to_today_day_grid() {
        let state = CalendarViewState::default();
        assert_eq!(state.selected_date, Local::now().date_naive());
        assert_eq!(state.granularity, ViewGranularity::Day);
        assert_eq!(state.display_mode, DisplayMode::Grid);
        assert!(state.search_filter.is_empty());
    }

    #[test]
    fn day_navigation_moves_one_day() {
        let mut state = CalendarViewState::new(date(2025, 1, 31));
        state.navigate(1);
        assert_eq!(state.selected_date, date(2025, 2, 1));
        state.navigate(-1);
        assert_eq!(state.selected_date, date(2025, 1, 31));
    }

    #[test]
    fn week_navigation_moves_seven_days() {
        let mut state = CalendarViewState::new(date(2025, 1, 15));
        state.set_granularity(ViewGranularity::Week);
        state.navigate(-1);
        assert_eq!(state.selected_date, date(2025, 1, 8));
    }

    #[test]
    fn month_navigation_clamps_to_month_end() {
        let mut state = CalendarViewState::new(date(2025, 1, 31));
        state.set_granularity(ViewGranularity::Month);
        state.navigate(1);
        assert_eq!(state.selected_date, date(2025, 2, 28));
    }

    #[test]
    fn formats_api_date_and_label() {
        let state = CalendarViewState::new(date(2025, 1, 13));
        assert_eq!(state.api_date(), "2025-01-13");
        assert_eq!(state.date_label(), "Thứ Hai - 13/01/2025");
    }

    #[test]
    fn sunday_label_uses_chu_nhat() {
        let state = CalendarViewState::new(date(2025, 1, 19));
        assert_eq!(state.date_label(), "Chủ Nhật - 19/01/2025");
    }

    #[test]
    fn toggles_display_mode() {
        let mut state = CalendarViewState::new(date(2025, 1, 13));
        state.toggle_display_mode();
        assert_eq!(state.display_mode, DisplayMode::List);
        state.toggle_display_mode();
        assert_eq!(state.display_mode, DisplayMode::Grid);
    }
}
