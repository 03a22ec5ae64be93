use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::domain::ports::{OrderRepository, OrderStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    /// Operations executing on blocking threads at the same time.
    pub workers: usize,
    /// Operations allowed to wait for a worker before new ones are rejected.
    pub queue_capacity: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_capacity: 64,
        }
    }
}

/// Runs a blocking [`OrderRepository`] on tokio's blocking pool, bounded by
/// [`StoreLimits`]. Calls beyond `workers + queue_capacity` in flight fail
/// fast with [`DomainError::Storage`].
pub struct BlockingOrderStore<R> {
    repo: Arc<R>,
    workers: Arc<Semaphore>,
    admission: Arc<Semaphore>,
}

impl<R: OrderRepository> BlockingOrderStore<R> {
    pub fn new(repo: R, limits: StoreLimits) -> Self {
        let workers = limits.workers.max(1);
        Self {
            repo: Arc::new(repo),
            workers: Arc::new(Semaphore::new(workers)),
            admission: Arc::new(Semaphore::new(workers + limits.queue_capacity)),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: FnOnce(&R) -> Result<T, DomainError> + Send + 'static,
    {
        let admitted = Arc::clone(&self.admission)
            .try_acquire_owned()
            .map_err(|_| {
                log::warn!("Order store saturated, rejecting {}", op);
                DomainError::Storage("order store saturated".to_string())
            })?;
        let worker = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|_| DomainError::Storage("order store closed".to_string()))?;

        let repo = Arc::clone(&self.repo);
        // Permits travel with the job: a dropped caller does not free the slot
        // until the blocking call returns.
        tokio::task::spawn_blocking(move || {
            let _permits = (admitted, worker);
            f(&repo)
        })
        .await
        .map_err(|e| DomainError::Storage(format!("{op} worker failed: {e}")))?
    }
}

#[async_trait]
impl<R: OrderRepository> OrderStore for BlockingOrderStore<R> {
    async fn find_by_order_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        self.run("find_by_order_id", move |repo| repo.find_by_order_id(id))
            .await
    }

    async fn save(&self, order: Order) -> Result<Order, DomainError> {
        self.run("save", move |repo| repo.save(&order)).await
    }

    async fn delete_by_order_id(&self, id: Uuid) -> Result<(), DomainError> {
        self.run("delete_by_order_id", move |repo| repo.delete_by_order_id(id))
            .await
    }

    async fn delete_inserted_before(
        &self,
        inserted_before: DateTime<Utc>,
        updated_before: DateTime<Utc>,
    ) -> Result<usize, DomainError> {
        self.run("delete_inserted_before", move |repo| {
            repo.delete_inserted_before(inserted_before, updated_before)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::domain::order::fixtures;
    use crate::infrastructure::memory_repo::InMemoryOrderRepository;

    /// Repository whose finds block until the test releases them.
    struct GatedRepository {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl OrderRepository for GatedRepository {
        fn find_by_order_id(&self, _id: Uuid) -> Result<Option<Order>, DomainError> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
            Ok(None)
        }

        fn save(&self, order: &Order) -> Result<Order, DomainError> {
            Ok(order.clone())
        }

        fn delete_by_order_id(&self, _id: Uuid) -> Result<(), DomainError> {
            Ok(())
        }

        fn delete_inserted_before(
            &self,
            _inserted_before: DateTime<Utc>,
            _updated_before: DateTime<Utc>,
        ) -> Result<usize, DomainError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn find_distinguishes_absence_from_error() {
        let store = BlockingOrderStore::new(InMemoryOrderRepository::new(), StoreLimits::default());

        let found = store
            .find_by_order_id(Uuid::new_v4())
            .await
            .expect("absence is not an error");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn save_then_find_roundtrip() {
        let store = BlockingOrderStore::new(InMemoryOrderRepository::new(), StoreLimits::default());
        let order = fixtures::order();

        let saved = store.save(order.clone()).await.expect("save failed");
        let found = store
            .find_by_order_id(order.order_id)
            .await
            .expect("find failed");

        assert_eq!(saved, order);
        assert_eq!(found, Some(order));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn rejects_calls_beyond_workers_and_queue() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let repo = GatedRepository {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let store = Arc::new(BlockingOrderStore::new(
            repo,
            StoreLimits {
                workers: 1,
                queue_capacity: 0,
            },
        ));

        let busy = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.find_by_order_id(Uuid::new_v4()).await })
        };
        entered_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("first call should reach the repository");

        let rejected = store.find_by_order_id(Uuid::new_v4()).await;
        assert!(
            matches!(rejected, Err(DomainError::Storage(ref msg)) if msg.contains("saturated"))
        );

        release_tx.send(()).unwrap();
        assert!(busy.await.unwrap().unwrap().is_none());

        // Capacity is returned once the blocking call completes.
        release_tx.send(()).unwrap();
        assert!(store.find_by_order_id(Uuid::new_v4()).await.is_ok());
    }
}
