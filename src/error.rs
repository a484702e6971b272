use thiserror::Error;

use std::path::PathBuf;

use hickory_resolver::ResolveError;

#[derive(Debug, Error)]
pub enum SpfMacroError {
    #[error("at least one domain must be specified (e.g. txt:example.com)")]
    NoDomains,

    #[error("invalid domain entry '{entry}': {reason}")]
    InvalidDomainSpec { entry: String, reason: String },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to resolve domain {domain}: {source}")]
    DnsLookup {
        domain: String,
        #[source]
        source: ResolveError,
    },

    #[error("SPF chain through {domain} exceeds the maximum depth of {depth}")]
    RecursionLimit { domain: String, depth: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
