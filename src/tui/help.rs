use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::tui::session::Shell;

pub fn render(f: &mut Frame, shell: &Shell) {
    let theme = &shell.app.theme;
    let area = f.size();
    let help_width = 58;
    let help_height = 26;
    let x = (area.width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x,
        y,
        width: help_width.min(area.width),
        height: help_height.min(area.height),
    };

    f.render_widget(Clear, help_area);

    let section = Style::default().fg(theme.column_header);
    let help_text = vec![
        Line::from(vec![Span::styled("clinic-desk", Style::default().fg(theme.title).add_modifier(Modifier::BOLD))]),
        Line::from(""),
        Line::from(vec![Span::styled("Menu:", section)]),
        Line::from("  j/k        - Move in the page list"),
        Line::from("  Enter      - Open the highlighted page"),
        Line::from("  L          - Sign out"),
        Line::from("  q          - Quit"),
        Line::from(""),
        Line::from(vec![Span::styled("Calendar:", section)]),
        Line::from("  h/l        - Previous/next period"),
        Line::from("  t          - Today"),
        Line::from("  d/w/m      - Step by day/week/month"),
        Line::from("  g          - Toggle grid/list"),
        Line::from("  /          - Search by name or phone"),
        Line::from("  Tab        - Select next appointment"),
        Line::from("  s          - Cycle appointment state"),
        Line::from("  r          - Reload"),
        Line::from(""),
        Line::from(vec![Span::styled("Users (admin):", section)]),
        Line::from("  [ / ]      - Move in the viewer template"),
        Line::from("  Space      - Grant/revoke page"),
        Line::from("  S          - Save viewer template"),
        Line::from(""),
        Line::from("Press any key to close"),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help_paragraph, help_area);
}
