mod commands;
mod config;

use anyhow::{bail, Result};

use crate::config::{ReportConfig, SaveConfig};

const USAGE: &str = "usage: evaluator <save|report>  (settings are read from EVAL_* env vars)";

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // logs go to stderr, stdout carries the result
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let command = std::env::args().nth(1);
    match command.as_deref() {
        Some("save") => {
            let cfg = SaveConfig::from_env()?;
            let path = commands::run_save(&cfg)?;
            println!("{}", path.display());
        }
        Some("report") => {
            let cfg = ReportConfig::from_env()?;
            let report = commands::run_report(&cfg)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
