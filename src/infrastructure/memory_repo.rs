use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::domain::ports::OrderRepository;

/// Process-local [`OrderRepository`] with the same upsert and purge
/// semantics as the diesel one.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<Uuid, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders, counted through a poisoned lock.
    pub fn len(&self) -> usize {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Order>>, DomainError> {
        self.orders
            .lock()
            .map_err(|_| DomainError::Storage("in-memory order map poisoned".to_string()))
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn find_by_order_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    fn save(&self, order: &Order) -> Result<Order, DomainError> {
        self.lock()?.insert(order.order_id, order.clone());
        Ok(order.clone())
    }

    fn delete_by_order_id(&self, id: Uuid) -> Result<(), DomainError> {
        self.lock()?.remove(&id);
        Ok(())
    }

    fn delete_inserted_before(
        &self,
        inserted_before: DateTime<Utc>,
        updated_before: DateTime<Utc>,
    ) -> Result<usize, DomainError> {
        let mut orders = self.lock()?;
        let before = orders.len();
        orders.retain(|_, o| {
            !(o.insert_date_time < inserted_before && o.updated_at < updated_before)
        });
        Ok(before - orders.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::domain::order::{fixtures, now};

    #[test]
    fn save_then_find_returns_equal_order() {
        let repo = InMemoryOrderRepository::new();
        let order = fixtures::order();

        repo.save(&order).unwrap();

        assert_eq!(repo.find_by_order_id(order.order_id).unwrap(), Some(order));
    }

    #[test]
    fn purge_is_strictly_before_the_cutoff() {
        let repo = InMemoryOrderRepository::new();
        let mut at_cutoff = fixtures::order();
        let cutoff = now() - Duration::minutes(1);
        at_cutoff.insert_date_time = cutoff;
        at_cutoff.updated_at = cutoff;
        repo.save(&at_cutoff).unwrap();

        assert_eq!(repo.delete_inserted_before(cutoff, now()).unwrap(), 0);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn len_still_counts_after_the_lock_is_poisoned() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let order = fixtures::order();
        repo.save(&order).unwrap();

        let writer = Arc::clone(&repo);
        let panicked = std::thread::spawn(move || {
            let _guard = writer.orders.lock().unwrap();
            panic!("writer crashed while holding the lock");
        })
        .join();

        assert!(panicked.is_err());
        assert_eq!(repo.len(), 1);
        assert!(!repo.is_empty());
        assert!(matches!(
            repo.find_by_order_id(order.order_id),
            Err(DomainError::Storage(_))
        ));
    }
}
