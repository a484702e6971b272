use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::Notify;

/// Async task shutdown signaling mechanism combining Notify and AtomicBool
///
/// `notify_waiters()` only wakes tasks that are already waiting, so the flag is
/// what lets a task that starts waiting after `shutdown()` still return.
///
/// # Usage
/// ```no_run
/// use spfmacro::runtime::ShutdownSignal;
///
/// # async fn example() {
/// let signal = ShutdownSignal::new();
///
/// // In worker task:
/// tokio::select! {
///     _ = signal.wait() => { /* shutdown requested */ }
///     _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {}
/// }
///
/// // In main task:
/// signal.shutdown();
/// # }
/// ```
pub struct ShutdownSignal {
    notify: Notify,
    shutdown: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            notify: Notify::new(),
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Resolve once shutdown has been signaled
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent shutdown() is not missed
        notified.as_mut().enable();
        if self.is_shutdown() {
            return;
        }
        notified.await;
    }

    /// Signal shutdown to waiting tasks
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn wait_returns_after_shutdown() {
        let signal = ShutdownSignal::new();
        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        signal.shutdown();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter woke up")
            .unwrap();
    }

    #[tokio::test]
    async fn wait_after_shutdown_returns_immediately() {
        let signal = ShutdownSignal::new();
        signal.shutdown();

        assert!(signal.is_shutdown());
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("already shut down");
    }
}
