use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as TermEvent, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use clinic_desk::{
    access::{PageKey, Role, RoleTemplates, Session},
    api::{ApiClient, ApiError, LoginResponse, UserRecord},
    app::{AppState, LoadTicket, Overlay},
    calendar::{AppointmentState, ViewGranularity},
    forms::{Credentials, StateChange},
    source::{CalendarDay, CalendarSource, FallbackCalendarSource, FixtureCalendarSource, LiveCalendarSource, SourceError},
    storage::{config::Config, local_store::{LocalStore, StoredSession}},
    ui::theme::Theme,
};

use crate::tui::presentation::ui;

/// Results reported back to the event loop by spawned requests.
enum Message {
    CalendarLoaded(LoadTicket, Result<CalendarDay, SourceError>),
    LoggedIn(Result<LoginResponse, ApiError>),
    StateSaved(String, AppointmentState, Result<(), ApiError>),
    UsersLoaded(Result<Vec<UserRecord>, ApiError>),
    TemplatesSaved(RoleTemplates, Result<(), ApiError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub active_field: LoginField,
    pub error: Option<String>,
    pub submitting: bool,
}

impl LoginForm {
    fn new(remembered: Option<String>) -> Self {
        let active_field = if remembered.is_some() {
            LoginField::Password
        } else {
            LoginField::Email
        };
        Self {
            email: remembered.unwrap_or_default(),
            password: String::new(),
            active_field,
            error: None,
            submitting: false,
        }
    }

    fn active_buffer(&mut self) -> &mut String {
        match self.active_field {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    fn toggle_field(&mut self) {
        self.active_field = match self.active_field {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }
}

/// Admin view of users and the viewer permission template.
#[derive(Debug, Clone, Default)]
pub struct AdminPanel {
    pub users: Vec<UserRecord>,
    pub templates: RoleTemplates,
    pub cursor: usize,
    pub dirty: bool,
    pub loading: bool,
}

impl AdminPanel {
    pub fn cursor_page(&self) -> Option<PageKey> {
        PageKey::grantable().nth(self.cursor)
    }

    fn toggle_cursor_page(&mut self) {
        let Some(page) = self.cursor_page() else {
            return;
        };
        let mut viewer = self.templates.viewer.clone();
        if let Some(i) = viewer.iter().position(|p| *p == page) {
            viewer.remove(i);
        } else {
            viewer.push(page);
        }
        self.templates = RoleTemplates::new(viewer);
        self.dirty = true;
    }
}

pub struct Shell {
    pub app: AppState,
    pub login: LoginForm,
    pub admin: AdminPanel,
    pub search_buffer: String,
    pub sample: bool,
    config: Config,
    store: LocalStore,
    client: ApiClient,
    tx: UnboundedSender<Message>,
    rx: UnboundedReceiver<Message>,
}

impl Shell {
    fn new(config: Config, store: LocalStore, sample: bool) -> Self {
        let theme = Theme::get_by_name(&config.ui.theme);
        let app = AppState::new(config.grid())
            .with_theme(theme)
            .with_default_page(config.ui.default_page);
        let client = ApiClient::new(&config.server.base_url)
            .with_timeout(Duration::from_secs(config.server.timeout_seconds));
        let (tx, rx) = unbounded_channel();

        Self {
            app,
            login: LoginForm::new(store.remembered_email()),
            admin: AdminPanel::default(),
            search_buffer: String::new(),
            sample,
            config,
            store,
            client,
            tx,
            rx,
        }
    }

    /// Restores a stored session, re-reading the user so permission changes
    /// made since the last run take effect.
    async fn restore_session(&mut self) {
        if self.sample {
            self.app.sign_in(sample_session());
            self.after_navigation();
            return;
        }

        let stored = match self.store.load_session() {
            Ok(Some(stored)) => stored,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("Ignoring stored session: {}", e);
                return;
            }
        };

        self.client.set_token(Some(stored.token.clone()));
        let user = match self.client.me().await {
            Ok(user) => {
                let refreshed = StoredSession::new(stored.token, user.clone());
                if let Err(e) = self.store.save_session(&refreshed) {
                    tracing::warn!("Could not refresh stored session: {}", e);
                }
                user
            }
            Err(ApiError::Unauthorized) => {
                tracing::info!("Stored session expired");
                self.forget_session();
                return;
            }
            Err(e) => {
                tracing::warn!("Session check failed, using cached user: {}", e);
                stored.user
            }
        };

        self.app.sign_in(Session::from_user(&user));
        self.after_navigation();
    }

    fn forget_session(&mut self) {
        self.client.set_token(None);
        if let Err(e) = self.store.clear_session() {
            tracing::warn!("Could not clear stored session: {}", e);
        }
    }

    fn expire_session(&mut self) {
        self.forget_session();
        self.app.handle_unauthorized();
        self.login = LoginForm::new(self.store.remembered_email());
    }

    fn calendar_source(&self) -> Arc<dyn CalendarSource> {
        if self.sample {
            return Arc::new(FixtureCalendarSource);
        }
        let live = LiveCalendarSource::new(self.client.clone());
        Arc::new(FallbackCalendarSource::new(live).with_fallback(self.config.calendar.fallback_on_error))
    }

    fn start_calendar_load(&mut self) {
        let ticket = self.app.begin_load();
        let source = self.calendar_source();
        let date = self.app.calendar.selected_date;
        let company = self.config.company();
        let tx = self.tx.clone();

        tracing::info!("Loading calendar for {} ({:?})", date, ticket);
        tokio::spawn(async move {
            let result = source.load_day(date, company).await;
            let _ = tx.send(Message::CalendarLoaded(ticket, result));
        });
    }

    fn start_users_load(&mut self) {
        if self.sample {
            self.admin.templates = RoleTemplates::resolve(&[], self.store.load_templates());
            return;
        }
        self.admin.loading = true;
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.list_users().await;
            let _ = tx.send(Message::UsersLoaded(result));
        });
    }

    fn after_navigation(&mut self) {
        match self.app.current_page {
            PageKey::Calendar => self.start_calendar_load(),
            PageKey::Users => self.start_users_load(),
            _ => {}
        }
    }

    fn submit_login(&mut self) {
        let credentials = Credentials::new(&self.login.email, &self.login.password);
        if let Err(e) = credentials.validate() {
            self.login.error = Some(e.to_string());
            return;
        }

        self.login.submitting = true;
        self.login.error = None;
        let mut client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.login(&credentials).await;
            let _ = tx.send(Message::LoggedIn(result));
        });
    }

    fn save_templates(&mut self) {
        if self.sample {
            self.app.status_message = Some("Dữ liệu mẫu, không thể lưu".to_string());
            return;
        }
        let templates = self.admin.templates.clone();
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.save_role_permissions(&templates).await;
            let _ = tx.send(Message::TemplatesSaved(templates, result));
        });
    }

    fn cycle_selected_state(&mut self) {
        let Some((id, state)) = self.app.next_state_for_selected() else {
            return;
        };
        let client = self.client.clone();
        let tx = self.tx.clone();
        let change = StateChange {
            state: state.as_str().to_string(),
        };
        tokio::spawn(async move {
            let result = client.set_appointment_state(&id, &change).await;
            let _ = tx.send(Message::StateSaved(id, state, result));
        });
    }

    fn drain_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
        }
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::CalendarLoaded(ticket, Ok(day)) => {
                self.app.complete_load(ticket, day);
            }
            Message::CalendarLoaded(ticket, Err(err)) => {
                let unauthorized = matches!(err, SourceError::Unauthorized);
                if self.app.fail_load(ticket, &err) && unauthorized {
                    self.forget_session();
                    self.login = LoginForm::new(self.store.remembered_email());
                }
            }
            Message::LoggedIn(Ok(login)) => {
                self.login.submitting = false;
                self.client.set_token(Some(login.token.clone()));
                if let Err(e) = self.store.remember_email(&login.user.email) {
                    tracing::warn!("Could not remember e-mail: {}", e);
                }
                if let Err(e) = self.store.save_session(&StoredSession::new(login.token, login.user.clone())) {
                    tracing::warn!("Could not store session: {}", e);
                }
                self.login.password.clear();
                self.app.sign_in(Session::from_user(&login.user));
                self.after_navigation();
            }
            Message::LoggedIn(Err(err)) => {
                self.login.submitting = false;
                self.login.error = Some(match err {
                    ApiError::Forbidden(message) => message,
                    ApiError::Validation(v) => v.to_string(),
                    other => format!("Không thể đăng nhập: {}", other),
                });
            }
            Message::StateSaved(id, state, Ok(())) => {
                self.app.status_message = Some(format!("Đã cập nhật trạng thái: {}", state.label()));
                self.app.apply_state_change(&id, state);
            }
            Message::StateSaved(_, _, Err(err)) => self.report_error(err),
            Message::UsersLoaded(Ok(users)) => {
                self.admin.loading = false;
                self.admin.templates = RoleTemplates::resolve(&users, self.store.load_templates());
                self.admin.users = users;
                self.admin.dirty = false;
            }
            Message::UsersLoaded(Err(err)) => {
                self.admin.loading = false;
                self.report_error(err);
            }
            Message::TemplatesSaved(templates, Ok(())) => {
                if let Err(e) = self.store.save_templates(&templates) {
                    tracing::warn!("Could not cache role defaults: {}", e);
                }
                self.admin.dirty = false;
                self.app.status_message = Some("Đã lưu quyền mặc định cho Viewer".to_string());
                // Viewer maps were rewritten server-side.
                self.start_users_load();
            }
            Message::TemplatesSaved(_, Err(err)) => self.report_error(err),
        }
    }

    fn report_error(&mut self, err: ApiError) {
        if err.is_unauthorized() {
            self.expire_session();
        } else {
            tracing::error!("Request failed: {}", err);
            self.app.status_message = Some(err.to_string());
        }
    }

    /// Returns `true` when the shell should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if !self.app.is_signed_in() {
            return self.handle_login_key(code);
        }

        match self.app.overlay {
            Some(Overlay::Help) => {
                self.app.overlay = None;
                return false;
            }
            Some(Overlay::Search) => {
                self.handle_search_key(code);
                return false;
            }
            None => {}
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('?') => self.app.toggle_help(),
            KeyCode::Char('j') | KeyCode::Down => self.app.move_sidebar(1),
            KeyCode::Char('k') | KeyCode::Up => self.app.move_sidebar(-1),
            KeyCode::Enter => {
                if let Some(page) = self.app.sidebar_page()
                    && self.app.navigate(page).is_ok()
                {
                    self.after_navigation();
                }
            }
            KeyCode::Char('L') => {
                self.logout();
            }
            _ if self.app.current_page == PageKey::Calendar => self.handle_calendar_key(code),
            _ if self.app.current_page == PageKey::Users => self.handle_admin_key(code),
            _ => {}
        }
        false
    }

    fn handle_calendar_key(&mut self, code: KeyCode) {
        let reload = match code {
            KeyCode::Char('h') | KeyCode::Left => {
                self.app.calendar.navigate(-1);
                true
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.app.calendar.navigate(1);
                true
            }
            KeyCode::Char('t') => {
                self.app.calendar.go_to_today();
                true
            }
            KeyCode::Char('d') => {
                self.app.calendar.set_granularity(ViewGranularity::Day);
                false
            }
            KeyCode::Char('w') => {
                self.app.calendar.set_granularity(ViewGranularity::Week);
                false
            }
            KeyCode::Char('m') => {
                self.app.calendar.set_granularity(ViewGranularity::Month);
                false
            }
            KeyCode::Char('g') => {
                self.app.calendar.toggle_display_mode();
                false
            }
            KeyCode::Char('r') => true,
            KeyCode::Char('/') => {
                self.search_buffer = self.app.calendar.search_filter.clone();
                self.app.overlay = Some(Overlay::Search);
                false
            }
            KeyCode::Tab => {
                self.app.move_card_selection(1);
                false
            }
            KeyCode::BackTab => {
                self.app.move_card_selection(-1);
                false
            }
            KeyCode::Char('s') => {
                self.cycle_selected_state();
                false
            }
            _ => false,
        };

        if reload {
            self.start_calendar_load();
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.search_buffer.clear();
                self.app.set_search("");
                self.app.overlay = None;
            }
            KeyCode::Enter => {
                self.app.overlay = None;
            }
            KeyCode::Backspace => {
                self.search_buffer.pop();
                self.app.set_search(&self.search_buffer.clone());
            }
            KeyCode::Char(c) => {
                self.search_buffer.push(c);
                self.app.set_search(&self.search_buffer.clone());
            }
            _ => {}
        }
    }

    fn handle_admin_key(&mut self, code: KeyCode) {
        let count = PageKey::grantable().count();
        match code {
            KeyCode::Char(']') => self.admin.cursor = (self.admin.cursor + 1).min(count - 1),
            KeyCode::Char('[') => self.admin.cursor = self.admin.cursor.saturating_sub(1),
            KeyCode::Char(' ') => self.admin.toggle_cursor_page(),
            KeyCode::Char('S') => self.save_templates(),
            KeyCode::Char('r') => self.start_users_load(),
            _ => {}
        }
    }

    fn handle_login_key(&mut self, code: KeyCode) -> bool {
        if self.login.submitting {
            return false;
        }
        match code {
            KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => self.login.toggle_field(),
            KeyCode::Enter => match self.login.active_field {
                LoginField::Email => self.login.toggle_field(),
                LoginField::Password => self.submit_login(),
            },
            KeyCode::Backspace => {
                self.login.active_buffer().pop();
            }
            KeyCode::Char(c) => self.login.active_buffer().push(c),
            _ => {}
        }
        false
    }

    fn logout(&mut self) {
        if !self.sample {
            let mut client = self.client.clone();
            tokio::spawn(async move {
                if let Err(e) = client.logout().await {
                    tracing::warn!("Logout request failed: {}", e);
                }
            });
        }
        self.forget_session();
        self.app.sign_out();
        self.admin = AdminPanel::default();
        self.login = LoginForm::new(self.store.remembered_email());
        if self.sample {
            self.app.sign_in(sample_session());
            self.after_navigation();
        }
    }
}

fn sample_session() -> Session {
    Session {
        user_id: "sample".to_string(),
        name: "Demo".to_string(),
        email: "demo@localhost".to_string(),
        role: Role::Admin,
        permissions: RoleTemplates::default().permissions_for(Role::Admin),
        active: true,
    }
}

pub async fn run_tui(config: Config, sample: bool) -> Result<(), io::Error> {
    let store = LocalStore::new(Config::config_dir());
    let mut shell = Shell::new(config, store, sample);
    shell.restore_session().await;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut shell).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    shell: &mut Shell,
) -> io::Result<()> {
    loop {
        shell.drain_messages();
        terminal.draw(|f| ui(f, shell))?;

        if !event::poll(Duration::from_millis(100))? {
            tokio::task::yield_now().await;
            continue;
        }

        if let TermEvent::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && shell.handle_key(key.code)
        {
            return Ok(());
        }
    }
}
