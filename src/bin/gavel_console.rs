use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::mysql::MySqlPoolOptions;
use tokio::io::BufReader;

use gavel::area::AreaRoster;
use gavel::client::ClientRoster;
use gavel::config::ServerConfig;
use gavel::console::{Console, TracingSink};
use gavel::permissions::RoleTable;
use gavel::users::SqlUserStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut conf_file = "conf/server.yaml".to_string();

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "--h" | "--?" | "/?" => {
                println!("Usage: gavel_console [--conf FILE]");
                return Ok(());
            }
            "--conf" => {
                if i + 1 < args.len() {
                    i += 1;
                    conf_file = args[i].clone();
                } else {
                    eprintln!("Error: --conf requires a FILE argument");
                    return Ok(());
                }
            }
            _ => {}
        }
        i += 1;
    }

    let config = ServerConfig::from_file(&conf_file)?;

    let db_url = format!(
        "mysql://{}:{}@{}:{}/{}",
        config.sql_id, config.sql_pw, config.sql_ip, config.sql_port, config.sql_db
    );
    let pool = MySqlPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .with_context(|| format!("Cannot connect to DB: {}", config.sql_ip))?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Cannot run database migrations")?;

    let roles = RoleTable::from_defs(&config.roles).context("Invalid role definitions")?;
    let users = SqlUserStore::new(pool);
    let areas = Arc::new(AreaRoster::from_names(
        config.area.iter().cloned(),
        config.log_buffer_len,
    ));
    let clients = Arc::new(ClientRoster::new(config.max_players));

    tracing::info!(
        "[console] [started] areas={} roles={} max_players={}",
        areas.len(),
        roles.len(),
        config.max_players
    );

    let console = Console::new(
        users,
        roles,
        Arc::clone(&clients),
        areas,
        clients,
        TracingSink,
        config.console,
    );

    console.listen(BufReader::new(tokio::io::stdin())).await?;

    tracing::info!("[console] [stopped] console loop ended");
    Ok(())
}
