use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use clinic_desk::access::{PageKey, Role};

use crate::tui::session::Shell;

pub fn render(f: &mut Frame, shell: &Shell, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_users(f, shell, chunks[0]);
    render_template(f, shell, chunks[1]);
}

fn render_users(f: &mut Frame, shell: &Shell, area: Rect) {
    let theme = &shell.app.theme;
    let admin = &shell.admin;

    let mut lines = Vec::new();
    if admin.loading {
        lines.push(Line::from(Span::styled("Đang tải...", Style::default().fg(theme.dimmed))));
    }
    for user in &admin.users {
        let role = Role::from_wire(&user.role);
        let active = user.active.unwrap_or(true);
        let style = if active {
            Style::default()
        } else {
            Style::default().fg(theme.dimmed)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<24}", user.name), style.add_modifier(Modifier::BOLD)),
            Span::styled(format!("{:<28}", user.email), style),
            Span::styled(role.as_str().to_string(), Style::default().fg(theme.column_header)),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled("Chưa có người dùng", Style::default().fg(theme.dimmed))));
    }

    let users = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Người dùng"));
    f.render_widget(users, area);
}

fn render_template(f: &mut Frame, shell: &Shell, area: Rect) {
    let theme = &shell.app.theme;
    let admin = &shell.admin;

    let mut lines: Vec<Line> = PageKey::grantable()
        .enumerate()
        .map(|(i, page)| {
            let granted = admin.templates.viewer.contains(&page);
            let mark = if granted { "[x]" } else { "[ ]" };
            let mut style = Style::default();
            if i == admin.cursor {
                style = style.bg(theme.selected_bg).fg(theme.selected_fg);
            }
            Line::from(Span::styled(format!("{} {}", mark, page.label()), style))
        })
        .collect();

    if admin.dirty {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Chưa lưu (S để lưu)", Style::default().fg(theme.warning))));
    }

    let title = "Quyền mặc định: Viewer";
    let template = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(template, area);
}
