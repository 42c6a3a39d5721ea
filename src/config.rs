use std::{net::SocketAddr, path::PathBuf};

use clap::{ArgAction, Parser};

/// Server settings, read from flags, the environment or a `.env` file.
#[derive(Debug, Clone, Parser)]
#[command(version, about = "REST API over todos and posts")]
pub struct Config {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
    /// Persist collections in a sled database at this path instead of memory.
    #[arg(long, env = "DATABASE_PATH")]
    pub db_path: Option<PathBuf>,
    /// Start empty collections with sample records.
    #[arg(long, env = "SEED_DATA", action = ArgAction::Set, default_value_t = true)]
    pub seed: bool,
}

impl Config {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Config::parse()
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }
}
