use crate::calendar::{AppointmentCard, CalendarLayout};

/// Terminal rows per grid hour; one row is half an hour.
pub const ROWS_PER_HOUR: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedCard<'a> {
    pub column: usize,
    pub row: usize,
    pub rows: usize,
    pub card: &'a AppointmentCard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerminalGrid<'a> {
    pub total_rows: usize,
    pub headers: Vec<&'a str>,
    /// `(row, label)` for every hour on the ruler.
    pub ruler: Vec<(usize, &'a str)>,
    pub cards: Vec<PlacedCard<'a>>,
}

fn to_rows(pixels: f64, pixels_per_hour: f64) -> f64 {
    pixels / pixels_per_hour * ROWS_PER_HOUR as f64
}

/// Maps the pixel geometry of a layout onto terminal rows.
pub fn place_cards(layout: &CalendarLayout) -> TerminalGrid<'_> {
    let pph = layout.pixels_per_hour;
    let total_rows = to_rows(layout.grid_height, pph).round() as usize;

    let cards = layout
        .columns
        .iter()
        .enumerate()
        .flat_map(|(column, col)| {
            col.cards.iter().map(move |card| PlacedCard {
                column,
                row: to_rows(card.top, pph).floor() as usize,
                rows: (to_rows(card.height, pph).ceil() as usize).max(1),
                card,
            })
        })
        .collect();

    TerminalGrid {
        total_rows,
        headers: layout.columns.iter().map(|c| c.doctor.as_str()).collect(),
        ruler: layout
            .hour_labels
            .iter()
            .enumerate()
            .map(|(i, label)| (i * ROWS_PER_HOUR as usize, label.as_str()))
            .collect(),
        cards,
    }
}

/// Text lines a card shows, following its disclosure tier.
pub fn card_lines(card: &AppointmentCard) -> Vec<String> {
    let content = &card.content;
    let mut lines = vec![content.name.clone(), content.time_label.clone()];
    if let Some(phone) = &content.phone {
        lines.push(phone.clone());
    }
    if let Some(note) = &content.note {
        lines.push(note.clone());
    }
    lines
}

pub fn fit_width(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut truncated: String = text.chars().take(width.saturating_sub(1)).collect();
        truncated.push('…');
        truncated
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

/// Column text for every row of the grid. A later card overwrites the rows of
/// an earlier one it overlaps.
pub fn column_rows(grid: &TerminalGrid<'_>, column: usize) -> Vec<Option<String>> {
    let mut rows: Vec<Option<String>> = vec![None; grid.total_rows];
    let mut placed: Vec<&PlacedCard<'_>> = grid.cards.iter().filter(|p| p.column == column).collect();
    placed.sort_by_key(|p| p.row);

    for placement in placed {
        let lines = card_lines(placement.card);
        for offset in 0..placement.rows {
            let row = placement.row + offset;
            if row >= rows.len() {
                break;
            }
            let text = lines.get(offset).map(String::as_str).unwrap_or("");
            rows[row] = Some(format!("│ {}", text));
        }
    }
    rows
}

/// Plain-text rendering of the day grid for the command line.
pub fn render_text(layout: &CalendarLayout, title: &str, column_width: usize) -> String {
    let grid = place_cards(layout);
    let ruler_width = 6;
    let mut out = Vec::new();

    out.push(title.to_string());
    out.push(format!("Tổng: {} lịch hẹn", layout.appointment_count));
    out.push(String::new());

    let mut header = fit_width("", ruler_width);
    for name in &grid.headers {
        header.push_str(" | ");
        header.push_str(&fit_width(name, column_width));
    }
    out.push(header.trim_end().to_string());
    out.push("-".repeat(ruler_width + grid.headers.len() * (column_width + 3)));

    let columns: Vec<Vec<Option<String>>> = (0..grid.headers.len())
        .map(|c| column_rows(&grid, c))
        .collect();

    for row in 0..grid.total_rows {
        let label = grid
            .ruler
            .iter()
            .find(|(r, _)| *r == row)
            .map(|(_, l)| *l)
            .unwrap_or("");
        let mut line = fit_width(label, ruler_width);
        for column in &columns {
            line.push_str(" | ");
            let cell = column[row].as_deref().unwrap_or("");
            line.push_str(&fit_width(cell, column_width));
        }
        out.push(line.trim_end().to_string());
    }

    let unlisted: usize = layout.unlisted.iter().map(|b| b.cards.len()).sum();
    if unlisted > 0 {
        out.push(String::new());
        out.push(format!("{} lịch hẹn của bác sĩ ngoài danh sách không hiển thị", unlisted));
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{Appointment, AppointmentState, GridConfig};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn create_appointment(id: &str, doctor: &str, hour: u32, minute: u32, duration: u32) -> Appointment {
        Appointment {
            id: id.to_string(),
            partner_id: None,
            partner_display_name: format!("[T{}] Khách {}", id, id),
            partner_phone: "0900000000".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 15)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap(),
            duration_minutes: duration,
            doctor: Some(doctor.to_string()),
            doctor_name: None,
            state: AppointmentState::Confirmed,
            color_tag: String::new(),
            note: Some("Cạo vôi".to_string()),
            reason: None,
        }
    }

    fn layout_for(appointments: &[Appointment]) -> CalendarLayout {
        let doctors = vec!["BS. A".to_string(), "BS. B".to_string()];
        CalendarLayout::build(&doctors, appointments, &GridConfig::default())
    }

    #[test]
    fn grid_has_two_rows_per_hour() {
        let layout = layout_for(&[]);
        let grid = place_cards(&layout);

        assert_eq!(grid.total_rows, 34);
        assert_eq!(grid.ruler.first(), Some(&(0, "06:00")));
        assert_eq!(grid.ruler.last(), Some(&(32, "22:00")));
    }

    #[test]
    fn card_rows_follow_pixel_geometry() {
        let layout = layout_for(&[create_appointment("1", "BS. B", 8, 30, 60)]);
        let grid = place_cards(&layout);

        let placed = &grid.cards[0];
        assert_eq!(placed.column, 1);
        assert_eq!(placed.row, 5);
        assert_eq!(placed.rows, 2);
    }

    #[test]
    fn short_card_still_takes_one_row() {
        let layout = layout_for(&[create_appointment("1", "BS. A", 9, 0, 5)]);
        let grid = place_cards(&layout);

        assert_eq!(grid.cards[0].rows, 1);
    }

    #[test]
    fn card_lines_respect_disclosure_tiers() {
        let layout = layout_for(&[
            create_appointment("1", "BS. A", 9, 0, 15),
            create_appointment("2", "BS. A", 10, 0, 60),
        ]);
        let cards: Vec<_> = layout.cards().collect();

        assert_eq!(card_lines(cards[0]), vec!["Khách 1".to_string(), "09:00 - 09:15".to_string()]);
        assert_eq!(card_lines(cards[1]).len(), 4);
    }

    #[test]
    fn fit_width_pads_and_truncates() {
        assert_eq!(fit_width("ab", 4), "ab  ");
        assert_eq!(fit_width("abcdef", 4), "abc…");
    }

    #[test]
    fn text_render_shows_headers_and_cards() {
        let layout = layout_for(&[create_appointment("1", "BS. A", 8, 30, 60)]);
        let text = render_text(&layout, "Thứ Tư - 15/01/2025", 18);

        assert!(text.starts_with("Thứ Tư - 15/01/2025\nTổng: 1 lịch hẹn"));
        assert!(text.contains("BS. A"));
        assert!(text.contains("│ Khách 1"));
        assert!(text.contains("│ 08:30 - 09:30"));
    }

    #[test]
    fn text_render_mentions_unlisted_doctors() {
        let layout = layout_for(&[create_appointment("1", "BS. Z", 8, 0, 30)]);
        let text = render_text(&layout, "day", 12);

        assert!(text.contains("1 lịch hẹn của bác sĩ ngoài danh sách"));
    }
}
