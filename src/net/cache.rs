use std::{
    net::{IpAddr, Ipv4Addr},
    sync::{Arc, PoisonError, RwLock},
};

use ipnet::Ipv4Net;

use super::parser::MechanismSpec;

/// Subnets in discovery order, duplicates allowed
pub type SubnetSet = Vec<Ipv4Net>;

/// Holds the current allow-list of subnets
///
/// The set itself is immutable once installed. Refreshing swaps in a new `Arc`
/// under the write lock, so a reader always works on one complete snapshot.
#[derive(Debug)]
pub struct SubnetCache {
    specs: Vec<MechanismSpec>,
    current: RwLock<Arc<SubnetSet>>,
}

impl SubnetCache {
    pub fn new(specs: Vec<MechanismSpec>) -> Self {
        Self {
            specs,
            current: RwLock::new(Arc::new(SubnetSet::new())),
        }
    }

    /// Configured top-level specs this cache is built from
    pub fn specs(&self) -> &[MechanismSpec] {
        &self.specs
    }

    /// Install `subnets` as the current set
    ///
    /// The write lock is held only for the pointer swap. The previous set is
    /// dropped once the last in-flight reader releases it.
    pub fn replace_subnets(&self, subnets: SubnetSet) {
        let next = Arc::new(subnets);
        let previous = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, next)
        };
        drop(previous);
    }

    /// Current set as a shared snapshot
    pub fn snapshot(&self) -> Arc<SubnetSet> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    /// Check whether `ip` falls inside any cached subnet
    ///
    /// Returns `false` for input that is not an IP address, and for IPv6 addresses.
    pub fn contains(&self, ip: &str) -> bool {
        match ip.trim().parse::<IpAddr>() {
            Ok(IpAddr::V4(v4)) => self.contains_addr(v4),
            _ => false,
        }
    }

    pub fn contains_addr(&self, ip: Ipv4Addr) -> bool {
        let subnets = self.snapshot();
        log::debug!("Checking {ip} against {} subnets", subnets.len());
        subnets.iter().any(|subnet| subnet.contains(&ip))
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
