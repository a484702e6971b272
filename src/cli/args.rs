use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Answer SPF macro queries for addresses authorized by SPF record chains"
)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Upstream DNS server used to expand SPF records
    #[arg(long = "upstream", value_name = "ADDR")]
    pub upstream: Option<SocketAddr>,

    /// Address the DNS responder listens on (UDP)
    #[arg(long = "listen", value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Seconds between two refreshes of the subnet allow-list
    #[arg(long = "refresh-interval", value_name = "SECS")]
    pub refresh_interval: Option<u64>,

    /// Domains to expand, in the form kind:domain (txt:example.com, a:mx.example.com, include:_spf.example.com)
    #[arg(value_delimiter = ',')]
    pub domains: Vec<String>,
}
