mod refresh;
mod server;
mod sync;

use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::{
    cli::Settings,
    error::SpfMacroError,
    net::{
        cache::SubnetCache,
        resolver::{HickoryExchange, SpfResolver},
    },
};

pub use refresh::{DEFAULT_REFRESH_INTERVAL, refresh_once, spawn_refresh};
pub use server::{DEFAULT_ACCEPT_RECORD, DEFAULT_ANSWER_TTL, SpfMacroHandler, serve};
pub use sync::ShutdownSignal;

/// Keep the SPF allow-list fresh and answer queries until Ctrl-C
pub async fn run(settings: Settings) -> Result<(), SpfMacroError> {
    let cache = Arc::new(SubnetCache::new(settings.specs));
    let resolver = SpfResolver::new(HickoryExchange::new(
        settings.upstream,
        settings.query_timeout,
    ))
    .with_max_depth(settings.max_depth);

    let shutdown_signal = ShutdownSignal::new();
    let refresh_handle = spawn_refresh(
        Arc::clone(&cache),
        resolver,
        settings.refresh_interval,
        Arc::clone(&shutdown_signal),
    );

    let socket = UdpSocket::bind(settings.listen).await?;
    log::info!(
        "Listening on {} (upstream {}, refresh every {}s)",
        settings.listen,
        settings.upstream,
        settings.refresh_interval.as_secs()
    );

    let handler = SpfMacroHandler::new(cache, settings.accept_record, settings.ttl);
    let result = tokio::select! {
        served = serve(socket, handler, Arc::clone(&shutdown_signal)) => served,
        signal = tokio::signal::ctrl_c() => {
            log::info!("Shutting down");
            signal.map_err(SpfMacroError::from)
        }
    };

    shutdown_signal.shutdown();
    refresh_handle
        .await
        .map_err(|_| std::io::Error::other("refresh task panicked"))?;

    result
}
