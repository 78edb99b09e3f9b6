use std::{
    env,
    io::{self, BufRead, Write},
    process::{Command, Stdio},
    time::Duration,
};

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};

use clinic_desk::{
    access::{attempt_navigate, filter_navigation, PageKey, Session},
    api::{ApiClient, ApiError},
    calendar::{CalendarLayout, CalendarViewState},
    forms::Credentials,
    source::{CalendarSource, FallbackCalendarSource, FixtureCalendarSource, LiveCalendarSource, SourceError},
    storage::{config::Config, local_store::{LocalStore, StoredSession}},
    ui::day_grid::render_text,
};

const USAGE: &str = "Usage: clinic-desk [--sample] [--calendar [YYYY-MM-DD]] [--login EMAIL] [--logout] [--pages]";
const COLUMN_WIDTH: usize = 22;

#[derive(Debug, Clone, PartialEq)]
pub enum CliMode {
    Interactive { sample: bool },
    Calendar { date: NaiveDate, sample: bool },
    Login(String),
    Logout,
    Pages,
}

pub fn usage() -> &'static str {
    USAGE
}

pub fn parse_cli_mode() -> Result<CliMode, String> {
    parse_args(env::args().skip(1))
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<CliMode, String> {
    let mut sample = false;
    let mut calendar_date = None;
    let mut mode = None;
    let mut args = args.peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sample" => {
                sample = true;
            }
            "--calendar" => {
                let target_date = match args.next_if(|next| !next.starts_with("--")) {
                    Some(date_str) => NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                        .map_err(|_| format!("Invalid date '{}'. Use YYYY-MM-DD.", date_str))?,
                    None => Local::now().date_naive(),
                };
                calendar_date = Some(target_date);
            }
            "--login" => {
                let email = args
                    .next_if(|next| !next.starts_with("--"))
                    .ok_or_else(|| "--login needs an e-mail address".to_string())?;
                mode = Some(CliMode::Login(email));
            }
            "--logout" => mode = Some(CliMode::Logout),
            "--pages" => mode = Some(CliMode::Pages),
            "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            _ => return Err(format!("Unknown argument: {}", arg)),
        }
    }

    if let Some(mode) = mode {
        return Ok(mode);
    }
    Ok(match calendar_date {
        Some(date) => CliMode::Calendar { date, sample },
        None => CliMode::Interactive { sample },
    })
}

fn client_for(config: &Config) -> ApiClient {
    ApiClient::new(&config.server.base_url)
        .with_timeout(Duration::from_secs(config.server.timeout_seconds))
}

/// Loads the stored session and refreshes it from the backend when possible.
async fn current_session(config: &Config, store: &LocalStore) -> anyhow::Result<(ApiClient, Session)> {
    let stored = store
        .load_session()
        .context("Failed to read stored session")?
        .context("Not signed in. Run `clinic-desk --login EMAIL` first.")?;

    let client = client_for(config).with_token(Some(stored.token.clone()));
    let user = match client.me().await {
        Ok(user) => {
            store.save_session(&StoredSession::new(stored.token, user.clone()))?;
            user
        }
        Err(ApiError::Unauthorized) => {
            store.clear_session()?;
            bail!("Session expired. Run `clinic-desk --login EMAIL` again.");
        }
        Err(e) => {
            tracing::warn!("Session check failed, using cached user: {}", e);
            stored.user
        }
    };

    Ok((client, Session::from_user(&user)))
}

pub async fn run_calendar_mode(config: &Config, date: NaiveDate, sample: bool) -> anyhow::Result<()> {
    let store = LocalStore::new(Config::config_dir());

    let day = if sample {
        FixtureCalendarSource::day(date)
    } else {
        let (client, session) = current_session(config, &store).await?;
        attempt_navigate(&session, PageKey::Calendar)?;

        let source = FallbackCalendarSource::new(LiveCalendarSource::new(client))
            .with_fallback(config.calendar.fallback_on_error);
        match source.load_day(date, config.company()).await {
            Ok(day) => day,
            Err(SourceError::Unauthorized) => {
                store.clear_session()?;
                bail!("Session expired. Run `clinic-desk --login EMAIL` again.");
            }
            Err(e) => return Err(e.into()),
        }
    };

    let layout = CalendarLayout::build(&day.doctors, &day.appointments, &config.grid());
    let mut title = CalendarViewState::new(date).date_label();
    if day.is_fixture() {
        title.push_str(" (dữ liệu mẫu)");
    }

    display_with_pager(&render_text(&layout, &title, COLUMN_WIDTH))?;
    Ok(())
}

pub async fn run_login_mode(config: &Config, email: &str) -> anyhow::Result<()> {
    let store = LocalStore::new(Config::config_dir());

    print!("Mật khẩu cho {}: ", email);
    io::stdout().flush()?;
    let mut password = String::new();
    io::stdin().lock().read_line(&mut password)?;

    let mut client = client_for(config);
    let login = client
        .login(&Credentials::new(email, password.trim_end_matches(['\r', '\n'])))
        .await?;

    store.save_session(&StoredSession::new(login.token, login.user.clone()))?;
    store.remember_email(&login.user.email)?;

    let session = Session::from_user(&login.user);
    println!("Đã đăng nhập: {} ({})", session.display_name(), session.role.as_str());
    print_pages(&session);
    Ok(())
}

pub async fn run_logout_mode(config: &Config) -> anyhow::Result<()> {
    let store = LocalStore::new(Config::config_dir());

    if let Some(stored) = store.load_session()? {
        let mut client = client_for(config).with_token(Some(stored.token));
        if let Err(e) = client.logout().await {
            tracing::warn!("Logout request failed: {}", e);
        }
    }
    store.clear_session()?;
    println!("Đã đăng xuất.");
    Ok(())
}

pub async fn run_pages_mode(config: &Config) -> anyhow::Result<()> {
    let store = LocalStore::new(Config::config_dir());
    let (_, session) = current_session(config, &store).await?;
    print_pages(&session);
    Ok(())
}

fn print_pages(session: &Session) {
    for line in page_lines(session) {
        println!("{}", line);
    }
}

fn page_lines(session: &Session) -> Vec<String> {
    filter_navigation(session, &PageKey::ALL)
        .into_iter()
        .map(|page| format!("{:<12} {}", page.as_str(), page.label()))
        .collect()
}

fn display_with_pager(text: &str) -> Result<(), io::Error> {
    let pager_value = env::var("PAGER").unwrap_or_else(|_| "less".to_string());
    let mut parts = pager_value.split_whitespace();
    let cmd = match parts.next() {
        Some(c) => c,
        None => {
            println!("{text}");
            return Ok(());
        }
    };
    let args: Vec<&str> = parts.collect();

    match Command::new(cmd)
        .args(&args)
        .stdin(Stdio::piped())
        .spawn()
    {
        Ok(mut child) => {
            if let Some(stdin) = child.stdin.as_mut() {
                stdin.write_all(text.as_bytes())?;
            }
            let _ = child.wait();
        }
        Err(_) => {
            println!("{text}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_desk::access::Role;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn parse(args: &[&str]) -> Result<CliMode, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_starts_interactive() {
        assert_eq!(parse(&[]), Ok(CliMode::Interactive { sample: false }));
    }

    #[test]
    fn calendar_takes_optional_date() {
        assert_eq!(
            parse(&["--calendar", "2025-01-15", "--sample"]),
            Ok(CliMode::Calendar {
                date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
                sample: true
            })
        );
        assert!(matches!(parse(&["--calendar"]), Ok(CliMode::Calendar { sample: false, .. })));
    }

    #[test]
    fn calendar_rejects_bad_date() {
        assert!(parse(&["--calendar", "15/01/2025"]).is_err());
    }

    #[test]
    fn login_requires_email() {
        assert!(parse(&["--login"]).is_err());
        assert_eq!(parse(&["--login", "a@b.vn"]), Ok(CliMode::Login("a@b.vn".to_string())));
    }

    #[test]
    fn unknown_argument_is_rejected() {
        assert!(parse(&["--agenda"]).is_err());
    }

    #[test]
    fn page_lines_hide_denied_pages() {
        let session = Session {
            user_id: "u".to_string(),
            name: "Lan".to_string(),
            email: "lan@clinic.vn".to_string(),
            role: Role::Viewer,
            permissions: BTreeMap::from([(PageKey::Calendar, true), (PageKey::Reports, false)]),
            active: true,
        };

        let lines = page_lines(&session);

        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("calendar"));
    }
}
