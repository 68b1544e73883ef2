//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `addressbook_core` linkage and open a store from the command line.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `addressbook_cli [DB_PATH] [LOG_DIR]`. Without a path an in-memory
//! store is used. With `LOG_DIR`, core logs go to rolling files there; the
//! level comes from `ADDRESSBOOK_LOG_LEVEL` or the build default.

use addressbook_core::{
    core_version, init_logging, AddressBookProvider, ChangeRegistry, LogLevel, LogSettings,
    QueryRequest, ResourceUri, Session, StoreConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const LOG_LEVEL_ENV: &str = "ADDRESSBOOK_LOG_LEVEL";

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => StoreConfig::file(path),
        None => StoreConfig::in_memory(),
    };
    let log_dir = args.next();

    println!("addressbook_core version={}", core_version());
    match run(&config, log_dir.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("addressbook_core error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &StoreConfig, log_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = log_dir {
        let settings = log_settings(dir)?;
        init_logging(&settings)?;
        println!(
            "addressbook_core logging level={} dir={}",
            settings.level.as_str(),
            settings.dir.display()
        );
    }

    let provider = AddressBookProvider::open(config, Arc::new(ChangeRegistry::new()))?;
    let users = ResourceUri::parse("/users")?;
    let cursor = provider.query(&Session::anonymous(), &users, &QueryRequest::new())?;

    println!(
        "addressbook_core store mode={} schema_version={} users={}",
        config.location.mode(),
        provider.store().schema_version(),
        cursor.remaining()
    );
    Ok(())
}

fn log_settings(dir: &str) -> Result<LogSettings, Box<dyn std::error::Error>> {
    let dir = PathBuf::from(dir);
    let dir = if dir.is_absolute() {
        dir
    } else {
        std::env::current_dir()?.join(dir)
    };
    let level = match std::env::var(LOG_LEVEL_ENV) {
        Ok(raw) => LogLevel::parse(&raw)?,
        Err(_) => LogLevel::build_default(),
    };
    Ok(LogSettings { level, dir })
}
