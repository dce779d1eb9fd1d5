//! Command-line interface.
//!
//! Flags override values from the optional config file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{self, BackendConfig, ConfigError, ProxyConfig};

#[derive(Debug, Parser)]
#[command(name = "rr-proxy")]
#[command(about = "Round-robin HTTP reverse proxy", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Interface to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// Backend base URL; repeat for each backend. Replaces the file's roster.
    #[arg(short, long = "backend", value_name = "URL")]
    pub backends: Vec<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Merge the config file (if any) with flags and validate the result.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::read_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(host) = self.host {
            config.listener.host = host;
        }
        if !self.backends.is_empty() {
            config.backends = self.backends.into_iter().map(BackendConfig::from).collect();
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        config::finalize(config)
    }
}
