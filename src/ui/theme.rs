use ratatui::style::Color;

use crate::calendar::VisualClass;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub title: Color,
    pub selected_bg: Color,
    pub selected_fg: Color,
    pub column_header: Color,
    pub hour_ruler: Color,
    pub confirmed: Color,
    pub completed: Color,
    pub cancelled: Color,
    pub warning: Color,
    pub dimmed: Color,
    pub status_bar: Color,
    pub error: Color,
    pub success: Color,
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            name: "default".to_string(),
            title: Color::Cyan,
            selected_bg: Color::Blue,
            selected_fg: Color::White,
            column_header: Color::Yellow,
            hour_ruler: Color::DarkGray,
            confirmed: Color::Cyan,
            completed: Color::Green,
            cancelled: Color::Red,
            warning: Color::Rgb(255, 165, 0),
            dimmed: Color::DarkGray,
            status_bar: Color::White,
            error: Color::Red,
            success: Color::Green,
        }
    }

    pub fn gruvbox() -> Self {
        Self {
            name: "gruvbox".to_string(),
            title: Color::Rgb(251, 184, 108),
            selected_bg: Color::Rgb(60, 56, 54),
            selected_fg: Color::Rgb(235, 219, 178),
            column_header: Color::Rgb(254, 128, 25),
            hour_ruler: Color::Rgb(146, 131, 116),
            confirmed: Color::Rgb(131, 165, 152),
            completed: Color::Rgb(184, 187, 38),
            cancelled: Color::Rgb(251, 73, 52),
            warning: Color::Rgb(254, 128, 25),
            dimmed: Color::Rgb(102, 92, 84),
            status_bar: Color::Rgb(235, 219, 178),
            error: Color::Rgb(251, 73, 52),
            success: Color::Rgb(184, 187, 38),
        }
    }

    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            title: Color::Rgb(136, 192, 208),
            selected_bg: Color::Rgb(59, 66, 82),
            selected_fg: Color::Rgb(236, 239, 244),
            column_header: Color::Rgb(235, 203, 139),
            hour_ruler: Color::Rgb(76, 86, 106),
            confirmed: Color::Rgb(129, 161, 193),
            completed: Color::Rgb(163, 190, 140),
            cancelled: Color::Rgb(191, 97, 106),
            warning: Color::Rgb(208, 135, 112),
            dimmed: Color::Rgb(67, 76, 94),
            status_bar: Color::Rgb(216, 222, 233),
            error: Color::Rgb(191, 97, 106),
            success: Color::Rgb(163, 190, 140),
        }
    }

    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            title: Color::Rgb(139, 233, 253),
            selected_bg: Color::Rgb(68, 71, 90),
            selected_fg: Color::Rgb(248, 248, 242),
            column_header: Color::Rgb(241, 250, 140),
            hour_ruler: Color::Rgb(98, 114, 164),
            confirmed: Color::Rgb(139, 233, 253),
            completed: Color::Rgb(80, 250, 123),
            cancelled: Color::Rgb(255, 85, 85),
            warning: Color::Rgb(255, 184, 108),
            dimmed: Color::Rgb(68, 71, 90),
            status_bar: Color::Rgb(248, 248, 242),
            error: Color::Rgb(255, 85, 85),
            success: Color::Rgb(80, 250, 123),
        }
    }

    pub fn get_by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "gruvbox" => Self::gruvbox(),
            "nord" => Self::nord(),
            "dracula" => Self::dracula(),
            _ => Self::default_theme(),
        }
    }

    pub fn available_themes() -> Vec<&'static str> {
        vec!["default", "gruvbox", "nord", "dracula"]
    }

    pub fn card_color(&self, visual: VisualClass) -> Color {
        match visual {
            VisualClass::Confirmed => self.confirmed,
            VisualClass::Completed => self.completed,
            VisualClass::Cancelled => self.cancelled,
            VisualClass::Warning => self.warning,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_falls_back_to_default() {
        assert_eq!(Theme::get_by_name("solarized"), Theme::default_theme());
    }

    #[test]
    fn theme_lookup_ignores_case() {
        assert_eq!(Theme::get_by_name("Nord").name, "nord");
    }

    #[test]
    fn every_available_theme_resolves_to_itself() {
        for name in Theme::available_themes() {
            assert_eq!(Theme::get_by_name(name).name, name);
        }
    }

    #[test]
    fn cancelled_cards_use_cancelled_colour() {
        let theme = Theme::default_theme();
        assert_eq!(theme.card_color(VisualClass::Cancelled), Color::Red);
        assert_ne!(theme.card_color(VisualClass::Warning), theme.card_color(VisualClass::Confirmed));
    }
}
