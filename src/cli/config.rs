use std::{
    fs,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::SpfMacroError,
    net::resolver::{DEFAULT_MAX_DEPTH, DEFAULT_QUERY_TIMEOUT, DEFAULT_UPSTREAM},
    runtime::{DEFAULT_ACCEPT_RECORD, DEFAULT_ANSWER_TTL, DEFAULT_REFRESH_INTERVAL},
};

pub const DEFAULT_LISTEN: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5353);

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub spf: SpfConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SpfConfig {
    /// Domains to expand, in the form kind:domain
    pub domains: Vec<String>,
    /// Upstream DNS server used for every lookup
    pub upstream: SocketAddr,
    pub refresh_interval_secs: u64,
    /// Per-query timeout
    pub timeout_secs: u64,
    /// Deepest include chain followed before a refresh pass fails
    pub max_depth: usize,
}

impl Default for SpfConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            upstream: DEFAULT_UPSTREAM,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL.as_secs(),
            timeout_secs: DEFAULT_QUERY_TIMEOUT.as_secs(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// TTL of the TXT answer sent for authorized addresses
    pub ttl: u32,
    /// TXT payload sent for authorized addresses
    pub accept_record: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN,
            ttl: DEFAULT_ANSWER_TTL,
            accept_record: DEFAULT_ACCEPT_RECORD.to_string(),
        }
    }
}

impl ConfigFile {
    /// Load configuration file
    pub fn load(path: &Path) -> Result<Self, SpfMacroError> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| SpfMacroError::ConfigParse {
            path: PathBuf::from(path),
            source,
        })
    }
}
