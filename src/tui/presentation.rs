use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use clinic_desk::{access::PageKey, app::Overlay};

use crate::tui::{admin, calendar_grid, help, login, session::Shell};

pub fn ui(f: &mut Frame, shell: &Shell) {
    if !shell.app.is_signed_in() {
        login::render(f, shell);
        return;
    }

    let app = &shell.app;
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(24),
            Constraint::Min(0),
        ])
        .split(main_chunks[1]);

    let user = app
        .session
        .as_ref()
        .map(|s| format!("{} ({})", s.display_name(), s.role.as_str()))
        .unwrap_or_default();
    let mode = if shell.sample { " - dữ liệu mẫu" } else { "" };
    let title = Paragraph::new(format!("clinic-desk{} - {} - {}", mode, app.current_page.label(), user))
        .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, main_chunks[0]);

    render_sidebar(f, shell, content_chunks[0]);

    match app.current_page {
        PageKey::Calendar => calendar_grid::render(f, shell, content_chunks[1]),
        PageKey::Users => admin::render(f, shell, content_chunks[1]),
        page => render_placeholder(f, shell, page, content_chunks[1]),
    }

    let status_text = if app.overlay == Some(Overlay::Search) {
        format!("/{}", shell.search_buffer)
    } else if let Some(message) = &app.status_message {
        message.clone()
    } else {
        "j/k: menu | Enter: mở | ?: trợ giúp | L: đăng xuất | q: thoát".to_string()
    };

    let status = Paragraph::new(status_text)
        .style(Style::default().fg(app.theme.status_bar))
        .alignment(if app.overlay == Some(Overlay::Search) { Alignment::Left } else { Alignment::Center })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, main_chunks[2]);

    if app.overlay == Some(Overlay::Help) {
        help::render(f, shell);
    }
}

fn render_sidebar(f: &mut Frame, shell: &Shell, area: Rect) {
    let app = &shell.app;
    let items: Vec<ListItem> = app
        .visible_pages()
        .into_iter()
        .enumerate()
        .map(|(i, page)| {
            let mut style = Style::default();
            if i == app.sidebar_index {
                style = style.bg(app.theme.selected_bg).fg(app.theme.selected_fg);
            }
            if page == app.current_page {
                style = style.add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::from(Span::styled(page.label(), style)))
        })
        .collect();

    let sidebar = List::new(items).block(Block::default().borders(Borders::ALL).title("Menu"));
    f.render_widget(sidebar, area);
}

fn render_placeholder(f: &mut Frame, shell: &Shell, page: PageKey, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            page.label(),
            Style::default().fg(shell.app.theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Trang này chỉ có trên giao diện web.",
            Style::default().fg(shell.app.theme.hour_ruler),
        )),
    ];
    let content = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(content, area);
}
