mod allocate;
mod db;
mod export;
mod import;
mod models;
mod run;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const DB_PATH_ENV: &str = "BUDGETSPLIT_DB";

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let db_path = get_db_path()?;
    let mut db = db::Database::open(&db_path)?;
    run::as_cli(&args, &mut db)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("budgetsplit=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn get_db_path() -> Result<std::path::PathBuf> {
    if let Some(path) = std::env::var_os(DB_PATH_ENV) {
        return Ok(path.into());
    }
    let proj_dirs = directories::ProjectDirs::from("com", "budgetsplit", "BudgetSplit")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("budgetsplit.db"))
}
