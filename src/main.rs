use chrono::{Local, Utc};
use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use questlog::cli::{self, Cli, CliError, Commands};
use questlog::{Config, Database, DateKey, Profile, Session};
use std::path::Path;

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;
    env_logger::init();

    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from_path(Path::new(path))?,
        None => Config::load_with_profile(profile)?,
    };

    let db_path = config.get_database_path();
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| eyre!("Database path contains invalid UTF-8"))?,
    )?;

    let today = match &cli.today {
        Some(raw) => raw
            .parse::<DateKey>()
            .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", raw, e)))?,
        None => DateKey::today(),
    };

    let mut session = Session::open(db, config.rules(), today)?;
    print!("{}", cli::render_judgments(session.judged_on_open()));

    let command = cli.command.unwrap_or(Commands::Status);
    cli::run(command, &mut session, Utc::now(), Local::now().naive_local())?;

    Ok(())
}
