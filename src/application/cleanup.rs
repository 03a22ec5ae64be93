use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::order_service::OrderService;

/// Stand-in deadline for intervals too long to add to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Result of one purge sweep, published for observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOutcome {
    pub finished_at: DateTime<Utc>,
    /// Number of removed orders, or the failure message.
    pub result: Result<usize, String>,
}

/// Periodically purges stale orders. A failed sweep is logged and retried
/// on the next tick; it never stops the scheduler.
pub struct CleanupScheduler {
    service: Arc<OrderService>,
    interval: Duration,
    retention: Duration,
}

impl CleanupScheduler {
    pub fn new(service: Arc<OrderService>, interval: Duration, retention: Duration) -> Self {
        Self {
            service,
            interval,
            retention,
        }
    }

    /// Spawns the sweep loop on the current tokio runtime. The first sweep
    /// runs one full interval after start.
    pub fn start(self) -> CleanupHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let (outcome_tx, outcome_rx) = watch::channel(None);

        log::info!(
            "Starting order cleanup every {:?} (retention {:?})",
            self.interval,
            self.retention
        );

        let task = tokio::spawn(async move {
            let now = tokio::time::Instant::now();
            let first = now.checked_add(self.interval).unwrap_or(now + FAR_FUTURE);
            let mut ticker = tokio::time::interval_at(first, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let outcome = self.sweep().await;
                        outcome_tx.send_replace(Some(outcome));
                    }
                }
            }

            log::info!("Order cleanup stopped");
        });

        CleanupHandle {
            shutdown: shutdown_tx,
            task,
            outcomes: outcome_rx,
        }
    }

    async fn sweep(&self) -> SweepOutcome {
        let result = match self.service.purge_stale(self.retention).await {
            Ok(removed) => {
                log::info!("Successfully removed {} old orders", removed);
                Ok(removed)
            }
            Err(e) => {
                log::error!("Error occurred during old orders removal: {}", e);
                Err(e.to_string())
            }
        };
        SweepOutcome {
            finished_at: Utc::now(),
            result,
        }
    }
}

pub struct CleanupHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
    outcomes: watch::Receiver<Option<SweepOutcome>>,
}

impl CleanupHandle {
    /// Receiver holding the latest sweep outcome (`None` before the first).
    pub fn subscribe(&self) -> watch::Receiver<Option<SweepOutcome>> {
        self.outcomes.clone()
    }

    /// Signals the loop to exit and waits for it. A sweep already in
    /// progress finishes first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            log::error!("Order cleanup task ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{Order, ShoppingCart};
    use crate::domain::ports::{CartFetcher, OrderStore};

    /// Store that only answers purges, failing while `failing` is set.
    #[derive(Default)]
    struct PurgeOnlyStore {
        failing: AtomicBool,
        purges: AtomicUsize,
    }

    #[async_trait]
    impl OrderStore for PurgeOnlyStore {
        async fn find_by_order_id(&self, _id: Uuid) -> Result<Option<Order>, DomainError> {
            Ok(None)
        }

        async fn save(&self, order: Order) -> Result<Order, DomainError> {
            Ok(order)
        }

        async fn delete_by_order_id(&self, _id: Uuid) -> Result<(), DomainError> {
            Ok(())
        }

        async fn delete_inserted_before(
            &self,
            _inserted_before: DateTime<Utc>,
            _updated_before: DateTime<Utc>,
        ) -> Result<usize, DomainError> {
            self.purges.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(DomainError::Storage("database unavailable".to_string()));
            }
            Ok(3)
        }
    }

    struct NoCarts;

    #[async_trait]
    impl CartFetcher for NoCarts {
        async fn fetch_cart(&self, _cart_id: Uuid) -> Result<ShoppingCart, DomainError> {
            Err(DomainError::cart_not_found())
        }
    }

    fn scheduler(store: Arc<PurgeOnlyStore>) -> CleanupScheduler {
        let service = Arc::new(OrderService::new(store, Arc::new(NoCarts)));
        CleanupScheduler::new(service, Duration::from_millis(20), Duration::from_secs(60))
    }

    async fn next_outcome(rx: &mut watch::Receiver<Option<SweepOutcome>>) -> SweepOutcome {
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("sweep did not run in time")
            .expect("scheduler dropped the channel");
        rx.borrow_and_update().clone().expect("outcome published")
    }

    #[tokio::test]
    async fn publishes_removed_count_after_each_sweep() {
        let store = Arc::new(PurgeOnlyStore::default());
        let handle = scheduler(store.clone()).start();
        let mut rx = handle.subscribe();

        let outcome = next_outcome(&mut rx).await;

        assert_eq!(outcome.result, Ok(3));
        handle.stop().await;
    }

    #[tokio::test]
    async fn failed_sweep_is_reported_and_retried_on_next_tick() {
        let store = Arc::new(PurgeOnlyStore::default());
        store.failing.store(true, Ordering::SeqCst);
        let handle = scheduler(store.clone()).start();
        let mut rx = handle.subscribe();

        let failed = next_outcome(&mut rx).await;
        assert!(matches!(failed.result, Err(ref msg) if msg.contains("database unavailable")));

        store.failing.store(false, Ordering::SeqCst);
        let recovered = loop {
            let outcome = next_outcome(&mut rx).await;
            if outcome.result.is_ok() {
                break outcome;
            }
        };

        assert_eq!(recovered.result, Ok(3));
        assert!(store.purges.load(Ordering::SeqCst) >= 2);
        handle.stop().await;
    }

    #[tokio::test]
    async fn out_of_range_retention_is_reported_every_tick() {
        let store = Arc::new(PurgeOnlyStore::default());
        let service = Arc::new(OrderService::new(store.clone(), Arc::new(NoCarts)));
        let handle =
            CleanupScheduler::new(service, Duration::from_millis(20), Duration::MAX).start();
        let mut rx = handle.subscribe();

        let first = next_outcome(&mut rx).await;
        let second = next_outcome(&mut rx).await;

        assert!(first.result.is_err());
        assert!(second.result.is_err());
        assert_eq!(store.purges.load(Ordering::SeqCst), 0);
        handle.stop().await;
    }

    #[tokio::test]
    async fn scheduler_with_huge_interval_starts_and_stops() {
        let store = Arc::new(PurgeOnlyStore::default());
        let service = Arc::new(OrderService::new(store.clone(), Arc::new(NoCarts)));
        let handle =
            CleanupScheduler::new(service, Duration::MAX, Duration::from_secs(60)).start();

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop().await;

        assert_eq!(store.purges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stop_ends_the_sweep_loop() {
        let store = Arc::new(PurgeOnlyStore::default());
        let handle = scheduler(store.clone()).start();
        let mut rx = handle.subscribe();
        next_outcome(&mut rx).await;

        handle.stop().await;
        let after_stop = store.purges.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.purges.load(Ordering::SeqCst), after_stop);
    }
}
