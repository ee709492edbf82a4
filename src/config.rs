//! Configuration structures and loading logic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub api_port: u16,
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content).context("Failed to parse TOML config")?
        } else {
            Self::default()
        };

        // Environment variable overrides
        if let Ok(port) = std::env::var("LIBRIS_API_PORT") {
            config.api_port = port.parse().context("Invalid LIBRIS_API_PORT value")?;
        }
        if let Ok(address) = std::env::var("LIBRIS_BIND_ADDRESS") {
            config.bind_address = address;
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API port must be non-zero");
        }

        self.bind_address
            .parse::<IpAddr>()
            .with_context(|| format!("Invalid bind address '{}'", self.bind_address))?;

        Ok(())
    }

    /// Socket address the API listens on
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.bind_address))?;
        Ok(SocketAddr::new(ip, self.api_port))
    }
}

// Default functions
fn default_api_port() -> u16 {
    3000
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
