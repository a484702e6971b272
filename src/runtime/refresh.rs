use std::{sync::Arc, time::Duration};

use tokio::time::MissedTickBehavior;

use crate::{
    error::SpfMacroError,
    net::{
        cache::SubnetCache,
        resolver::{DnsExchange, SpfResolver},
    },
};

use super::sync::ShutdownSignal;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Run one resolution pass and install the result
///
/// On failure the cache keeps its previous contents.
pub async fn refresh_once<E: DnsExchange>(
    cache: &SubnetCache,
    resolver: &SpfResolver<E>,
) -> Result<usize, SpfMacroError> {
    let subnets = resolver.resolve(cache.specs()).await?;
    let count = subnets.len();
    cache.replace_subnets(subnets);
    Ok(count)
}

/// Spawn the background task that keeps `cache` fresh
///
/// The first pass runs immediately, then one pass per `period`. A slow pass delays
/// the following tick instead of triggering a burst of catch-up passes.
pub fn spawn_refresh<E: DnsExchange>(
    cache: Arc<SubnetCache>,
    resolver: SpfResolver<E>,
    period: Duration,
    shutdown_signal: Arc<ShutdownSignal>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_signal.wait() => return,
                _ = ticker.tick() => {}
            }

            match refresh_once(&cache, &resolver).await {
                Ok(count) => {
                    log::info!("Installed {count} SPF subnets");
                }
                Err(err) => {
                    log::error!("There was an error retrieving SPF IPs: {err}");
                }
            }
        }
    })
}
