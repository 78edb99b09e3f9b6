use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use clinic_desk::{
    app::LoadStatus,
    calendar::{list_view::filter_list, DisplayMode, ViewGranularity},
    ui::day_grid::{card_lines, fit_width, place_cards},
};

use crate::tui::session::Shell;

const RULER_WIDTH: usize = 6;

pub fn render(f: &mut Frame, shell: &Shell, area: Rect) {
    let app = &shell.app;
    let theme = &app.theme;

    let granularity = match app.calendar.granularity {
        ViewGranularity::Day => "Ngày",
        ViewGranularity::Week => "Tuần",
        ViewGranularity::Month => "Tháng",
    };
    let mut header = vec![
        Span::styled(app.calendar.date_label(), Style::default().fg(theme.title).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  [{}]", granularity), Style::default().fg(theme.hour_ruler)),
    ];
    if let Some(layout) = &app.layout {
        header.push(Span::styled(
            format!("  {} lịch hẹn", layout.appointment_count),
            Style::default().fg(theme.column_header),
        ));
    }
    if app.calendar_day.as_ref().is_some_and(|d| d.is_fixture()) {
        header.push(Span::styled("  (dữ liệu mẫu)", Style::default().fg(theme.warning)));
    }
    match &app.load_status {
        LoadStatus::Loading => header.push(Span::styled("  Đang tải...", Style::default().fg(theme.hour_ruler))),
        LoadStatus::Failed(_) => header.push(Span::styled("  Lỗi tải dữ liệu", Style::default().fg(theme.error))),
        _ => {}
    }

    let mut lines = vec![Line::from(header), Line::from("")];
    let inner_width = area.width.saturating_sub(2) as usize;

    let scroll = match app.calendar.display_mode {
        DisplayMode::Grid => grid_lines(shell, inner_width, area.height as usize, &mut lines),
        DisplayMode::List => {
            list_lines(shell, &mut lines);
            0
        }
    };

    let content = Paragraph::new(lines)
        .scroll((scroll, 0))
        .block(Block::default().borders(Borders::ALL).title("Lịch hẹn"));
    f.render_widget(content, area);
}

/// Appends the grid rows and returns the scroll offset that keeps the
/// selected card visible.
fn grid_lines(shell: &Shell, width: usize, height: usize, lines: &mut Vec<Line<'static>>) -> u16 {
    let app = &shell.app;
    let theme = &app.theme;
    let Some(layout) = &app.layout else {
        return 0;
    };

    let grid = place_cards(layout);
    let columns = grid.headers.len().max(1);
    let column_width = (width.saturating_sub(RULER_WIDTH) / columns).saturating_sub(3).max(8);
    let selected_id = app.card_ids().get(app.selected_card).cloned();

    let mut header = vec![Span::raw(fit_width("", RULER_WIDTH))];
    for name in &grid.headers {
        header.push(Span::raw(" | "));
        header.push(Span::styled(
            fit_width(name, column_width),
            Style::default().fg(theme.column_header).add_modifier(Modifier::BOLD),
        ));
    }
    lines.push(Line::from(header));

    // Per column, the card (if any) covering each row and the text shown there.
    let mut cells: Vec<Vec<Option<(usize, String)>>> = vec![vec![None; grid.total_rows]; columns];
    let mut placed: Vec<(usize, &_)> = grid.cards.iter().enumerate().collect();
    placed.sort_by_key(|(_, p)| p.row);
    for (index, placement) in placed {
        let text = card_lines(placement.card);
        for offset in 0..placement.rows {
            let row = placement.row + offset;
            if row >= grid.total_rows {
                break;
            }
            let line = text.get(offset).cloned().unwrap_or_default();
            cells[placement.column][row] = Some((index, format!("│ {}", line)));
        }
    }

    let mut selected_row = 0;
    for row in 0..grid.total_rows {
        let label = grid
            .ruler
            .iter()
            .find(|(r, _)| *r == row)
            .map(|(_, l)| l.to_string())
            .unwrap_or_default();
        let mut spans = vec![Span::styled(fit_width(&label, RULER_WIDTH), Style::default().fg(theme.hour_ruler))];

        for column in &cells {
            spans.push(Span::styled(" | ", Style::default().fg(theme.hour_ruler)));
            match &column[row] {
                Some((index, text)) => {
                    let card = grid.cards[*index].card;
                    let mut style = if card.dimmed {
                        Style::default().fg(theme.dimmed)
                    } else {
                        Style::default().fg(theme.card_color(card.visual))
                    };
                    if selected_id.as_deref() == Some(card.appointment_id.as_str()) {
                        style = style.bg(theme.selected_bg).add_modifier(Modifier::BOLD);
                        if selected_row == 0 {
                            selected_row = row;
                        }
                    }
                    spans.push(Span::styled(fit_width(text, column_width), style));
                }
                None => spans.push(Span::raw(fit_width("", column_width))),
            }
        }
        lines.push(Line::from(spans));
    }

    let visible = height.saturating_sub(5);
    selected_row.saturating_sub(visible / 3) as u16
}

fn list_lines(shell: &Shell, lines: &mut Vec<Line<'static>>) {
    let app = &shell.app;
    let theme = &app.theme;
    let entries = filter_list(&app.list, &app.calendar.search_filter);

    if entries.is_empty() {
        lines.push(Line::from(Span::styled("Không có lịch hẹn", Style::default().fg(theme.dimmed))));
        return;
    }

    for entry in entries {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<15}", entry.time_label), Style::default().fg(theme.hour_ruler)),
            Span::styled(entry.name.clone(), Style::default().fg(theme.card_color(entry.visual)).add_modifier(Modifier::BOLD)),
            Span::raw(format!("  {}  ", entry.phone)),
            Span::styled(entry.doctor.clone(), Style::default().fg(theme.column_header)),
            Span::raw(format!("  {}", entry.state_label)),
        ]));
        if !entry.remark.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("               {}", entry.remark),
                Style::default().fg(theme.dimmed),
            )));
        }
    }
}
