use std::{
    future::Future,
    net::{Ipv4Addr, SocketAddr},
    pin::Pin,
    time::Duration,
};

use async_trait::async_trait;
use hickory_resolver::{
    TokioResolver,
    config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
    proto::rr::{Name, RData},
};
use ipnet::Ipv4Net;

#[cfg(test)]
use mockall::automock;

use super::{
    cache::SubnetSet,
    extract::{extract_domain_references, extract_subnets},
    parser::MechanismSpec,
};
use crate::error::SpfMacroError;

pub const DEFAULT_UPSTREAM: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::new(9, 9, 9, 9)), 53);
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);
/// Matches the RFC 7208 budget of ten DNS-querying terms
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// A single answer record, reduced to what the expander needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Direct address record
    Address(Ipv4Addr),
    /// Textual form of any other record
    Text(String),
}

/// DNS exchange abstraction for testing
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DnsExchange: Send + Sync + 'static {
    async fn exchange(&self, spec: &MechanismSpec) -> Result<Vec<Answer>, SpfMacroError>;
}

/// Production exchange that queries a single upstream server
pub struct HickoryExchange {
    resolver: TokioResolver,
}

impl HickoryExchange {
    /// Build a resolver pinned to `upstream`
    ///
    /// Each query is attempted once with the given timeout. The resolver cache is
    /// disabled so that every refresh pass sees fresh answers.
    pub fn new(upstream: SocketAddr, timeout: Duration) -> Self {
        let name_servers =
            NameServerConfigGroup::from_ips_clear(&[upstream.ip()], upstream.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], name_servers);

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.cache_size = 0;
        opts.ndots = 0;

        let resolver =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
                .with_options(opts)
                .build();

        Self { resolver }
    }
}

#[async_trait]
impl DnsExchange for HickoryExchange {
    async fn exchange(&self, spec: &MechanismSpec) -> Result<Vec<Answer>, SpfMacroError> {
        // Names that cannot be encoded would never be answered upstream
        let name = match Name::from_utf8(spec.fqdn()) {
            Ok(name) => name,
            Err(err) => {
                log::warn!("Skipping {spec}: not a valid DNS name ({err})");
                return Ok(Vec::new());
            }
        };
        let lookup = match self.resolver.lookup(name, spec.kind.record_type()).await {
            Ok(lookup) => lookup,
            Err(err) if err.is_no_records_found() => {
                log::debug!("No {} records for {}", spec.kind.record_type(), spec.domain);
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(SpfMacroError::DnsLookup {
                    domain: spec.domain.clone(),
                    source,
                });
            }
        };

        Ok(lookup.iter().map(answer_from_rdata).collect())
    }
}

fn answer_from_rdata(rdata: &RData) -> Answer {
    match rdata {
        RData::A(a) => Answer::Address(a.0),
        RData::TXT(txt) => Answer::Text(
            txt.txt_data()
                .iter()
                .map(|part| String::from_utf8_lossy(part))
                .collect(),
        ),
        other => Answer::Text(other.to_string()),
    }
}

type ExpandFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SpfMacroError>> + Send + 'a>>;

/// Expands SPF mechanism specs into the flat list of subnets they authorize
pub struct SpfResolver<E> {
    exchange: E,
    max_depth: usize,
}

impl<E: DnsExchange> SpfResolver<E> {
    pub fn new(exchange: E) -> Self {
        Self {
            exchange,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve every spec and flatten the discovered subnets
    ///
    /// Subnets are returned in discovery order: each answer's own subnets first,
    /// followed by whatever its nested references expand to. Duplicates are kept.
    ///
    /// # Errors
    /// Any failed exchange, anywhere in the chain, fails the whole call. The same
    /// applies when a chain grows deeper than the configured maximum. A reference
    /// back to a domain already on the current chain is skipped.
    pub async fn resolve(&self, specs: &[MechanismSpec]) -> Result<SubnetSet, SpfMacroError> {
        let mut subnets = Vec::new();
        for spec in specs {
            let mut chain = Vec::new();
            self.expand(spec, &mut chain, &mut subnets).await?;
        }
        Ok(subnets)
    }

    fn expand<'a>(
        &'a self,
        spec: &'a MechanismSpec,
        chain: &'a mut Vec<String>,
        subnets: &'a mut Vec<Ipv4Net>,
    ) -> ExpandFuture<'a> {
        Box::pin(async move {
            if chain.len() >= self.max_depth {
                return Err(SpfMacroError::RecursionLimit {
                    domain: spec.domain.clone(),
                    depth: self.max_depth,
                });
            }

            let answers = self.exchange.exchange(spec).await?;
            chain.push(spec.domain.to_ascii_lowercase());

            for answer in answers {
                match answer {
                    Answer::Address(ip) => subnets.push(Ipv4Net::from(ip)),
                    Answer::Text(text) => {
                        subnets.extend(extract_subnets(&text));

                        for reference in extract_domain_references(&text) {
                            let Some(nested) = MechanismSpec::parse(reference) else {
                                continue;
                            };
                            if chain.contains(&nested.domain.to_ascii_lowercase()) {
                                log::warn!(
                                    "Skipping {nested} referenced from {}: already being expanded",
                                    spec.domain
                                );
                                continue;
                            }
                            self.expand(&nested, chain, subnets).await?;
                        }
                    }
                }
            }

            chain.pop();
            log::debug!("Expanded {spec} ({} subnets so far)", subnets.len());
            Ok(())
        })
    }
}
