mod admin;
mod calendar_grid;
mod help;
mod login;
mod presentation;
mod session;

pub use session::run_tui;
