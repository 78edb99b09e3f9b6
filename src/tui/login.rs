use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::tui::session::{LoginField, Shell};

pub fn render(f: &mut Frame, shell: &Shell) {
    let form = &shell.login;
    let theme = &shell.app.theme;

    let area = f.size();
    let form_width = 56;
    let form_height = 12;
    let x = (area.width.saturating_sub(form_width)) / 2;
    let y = (area.height.saturating_sub(form_height)) / 2;

    let form_area = Rect {
        x,
        y,
        width: form_width.min(area.width),
        height: form_height.min(area.height),
    };

    f.render_widget(Clear, form_area);

    let active_color = theme.selected_bg;
    let inactive_color = Color::DarkGray;
    let label_color = |field: LoginField| if form.active_field == field { active_color } else { inactive_color };

    let masked = "•".repeat(form.password.chars().count());
    let mut lines = vec![
        Line::from(vec![Span::styled("Đăng nhập", Style::default().fg(theme.title).add_modifier(Modifier::BOLD))]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Email:    ", Style::default().fg(label_color(LoginField::Email))),
            Span::raw(form.email.clone()),
        ]),
        Line::from(vec![
            Span::styled("Mật khẩu: ", Style::default().fg(label_color(LoginField::Password))),
            Span::raw(masked),
        ]),
        Line::from(""),
    ];

    if form.submitting {
        lines.push(Line::from(Span::styled("Đang đăng nhập...", Style::default().fg(inactive_color))));
    } else if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(theme.error))));
    } else if let Some(message) = &shell.app.status_message {
        lines.push(Line::from(Span::styled(message.clone(), Style::default().fg(theme.warning))));
    } else {
        lines.push(Line::from(""));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab: đổi ô | Enter: đăng nhập | Esc: thoát",
        Style::default().fg(inactive_color),
    )));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL).title("clinic-desk"));
    f.render_widget(paragraph, form_area);
}
