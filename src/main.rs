use anyhow::{Result, ensure};
use clap::Parser;
use cli::{Cli, Commands};
use fitrack::{
    db,
    types::{Config, OutputFmt},
};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

fn init_tracing(verbose: bool) {
    let default = if verbose { "fitrack=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `--db` / `FITRACK_DB`, then the `db` config key, then the user data dir.
fn db_path(flag: Option<String>, cfg: &Config) -> Result<String> {
    if let Some(p) = flag.or_else(|| cfg.get("db").map(str::to_string)) {
        ensure!(!p.trim().is_empty(), "database path must not be empty");
        return Ok(p);
    }

    Ok(dirs::data_dir()
        .map(|d| d.join("fitrack").join("fitrack.db").to_string_lossy().into_owned())
        .unwrap_or_else(|| "./fitrack.db".to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let fmt = OutputFmt::from_flag(cli.json);

    let cmd = match cli.cmd {
        Commands::Config(cmd) => return commands::config::handle(cmd, fmt).await,
        other => other,
    };

    let cfg = Config::load_default();
    let path = db_path(cli.db, &cfg)?;

    let pool = db::open(&path).await?;

    match cmd {
        Commands::Workout(cmd) => commands::workout::handle(cmd, &pool, &cfg, fmt).await?,
        Commands::History(cmd) => commands::history::handle(cmd, &pool, fmt).await?,
        Commands::Exercise(cmd) => commands::exercise::handle(cmd, &pool, fmt).await?,
        Commands::Progress(cmd) => commands::progress::handle(cmd, &pool, &cfg, fmt).await?,
        Commands::Calendar { year, month } => commands::calendar::handle(&pool, year, month, fmt).await?,
        Commands::Status { graph } => commands::status::handle(&pool, graph, fmt).await?,
        Commands::Config(_) => unreachable!("handled before opening the database"),
    }

    pool.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_precedence() {
        let mut cfg = Config::default();
        cfg.map.insert("db".into(), "/tmp/from-config.db".into());

        assert_eq!(db_path(Some("/tmp/flag.db".into()), &cfg).unwrap(), "/tmp/flag.db");
        assert_eq!(db_path(None, &cfg).unwrap(), "/tmp/from-config.db");
        assert!(db_path(None, &Config::default()).unwrap().ends_with("fitrack.db"));
    }

    #[test]
    fn empty_db_path_is_an_error() {
        let err = db_path(Some(String::new()), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));

        let mut cfg = Config::default();
        cfg.map.insert("db".into(), "  ".into());
        assert!(db_path(None, &cfg).is_err());
    }
}
