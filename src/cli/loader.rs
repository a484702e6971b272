use std::{net::SocketAddr, time::Duration};

use crate::error::SpfMacroError;
use crate::net::{MechanismSpec, parse_domain_specs};

use super::args::Args;
use super::config::ConfigFile;

/// Fully resolved runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub specs: Vec<MechanismSpec>,
    pub upstream: SocketAddr,
    pub refresh_interval: Duration,
    pub query_timeout: Duration,
    pub max_depth: usize,
    pub listen: SocketAddr,
    pub ttl: u32,
    pub accept_record: String,
}

/// Load and merge settings from command line arguments and config file
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load complete settings from CLI arguments
    ///
    /// Config file values come first; CLI flags override scalars and CLI domains are
    /// appended. Fails before any DNS traffic when the domain list is empty or malformed.
    pub fn load(args: &Args) -> Result<Settings, SpfMacroError> {
        let config = match args.config.as_ref() {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let mut domains: Vec<String> = Vec::new();
        for domain in config.spf.domains.iter().chain(&args.domains) {
            if !domains.contains(domain) {
                domains.push(domain.clone());
            }
        }
        let specs = parse_domain_specs(&domains)?;

        Ok(Settings {
            specs,
            upstream: args.upstream.unwrap_or(config.spf.upstream),
            refresh_interval: Duration::from_secs(
                args.refresh_interval
                    .unwrap_or(config.spf.refresh_interval_secs)
                    .max(1),
            ),
            query_timeout: Duration::from_secs(config.spf.timeout_secs.max(1)),
            max_depth: config.spf.max_depth.max(1),
            listen: args.listen.unwrap_or(config.server.listen),
            ttl: config.server.ttl,
            accept_record: config.server.accept_record,
        })
    }
}
