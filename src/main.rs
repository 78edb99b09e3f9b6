mod cli;
use cli::{parse_cli_mode, usage, CliMode};
mod tui;
use tui::run_tui;

use clinic_desk::storage::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    let cli_mode = match parse_cli_mode() {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("Error: {}", err);
            println!("{}", usage());
            return Ok(());
        }
    };

    let config = match Config::load_or_create() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Edit {} and try again.", Config::config_path().display());
            tracing::error!("Configuration error: {}", e);
            return Ok(());
        }
    };

    let result = match cli_mode {
        CliMode::Interactive { sample } => run_tui(config, sample).await.map_err(anyhow::Error::from),
        CliMode::Calendar { date, sample } => cli::run_calendar_mode(&config, date, sample).await,
        CliMode::Login(email) => cli::run_login_mode(&config, &email).await,
        CliMode::Logout => cli::run_logout_mode(&config).await,
        CliMode::Pages => cli::run_pages_mode(&config).await,
    };

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}

fn setup_logging() {
    let log_dir = Config::config_dir();

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "clinic-desk.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    std::mem::forget(_guard);

    tracing::info!("clinic-desk started");
}
