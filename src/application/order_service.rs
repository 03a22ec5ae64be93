use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{now, CustomerInfo, DeliveryInfo, Order, OrderRecord};
use crate::domain::ports::{CartFetcher, OrderStore};

/// What a bulk import does after one record fails to save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportFailurePolicy {
    /// Report the failure for that record and keep importing the rest.
    #[default]
    Continue,
    /// Report the failure and stop; later records are not saved.
    Abort,
}

impl FromStr for ImportFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "abort" => Ok(Self::Abort),
            other => Err(format!("unknown import failure policy '{other}'")),
        }
    }
}

impl fmt::Display for ImportFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("continue"),
            Self::Abort => f.write_str("abort"),
        }
    }
}

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    carts: Arc<dyn CartFetcher>,
    import_policy: ImportFailurePolicy,
    purge_grace: Duration,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, carts: Arc<dyn CartFetcher>) -> Self {
        Self {
            store,
            carts,
            import_policy: ImportFailurePolicy::default(),
            purge_grace: Duration::ZERO,
        }
    }

    pub fn with_import_policy(mut self, policy: ImportFailurePolicy) -> Self {
        self.import_policy = policy;
        self
    }

    /// Orders mutated more recently than `grace` survive a purge even when
    /// their insertion time is past the retention window.
    pub fn with_purge_grace(mut self, grace: Duration) -> Self {
        self.purge_grace = grace;
        self
    }

    /// Snapshots the cart into a new unpaid order and persists it. The cart
    /// is fetched before the store is touched, so a failed fetch writes
    /// nothing.
    pub async fn create_order(
        &self,
        cart_id: Uuid,
        customer_info: CustomerInfo,
        delivery_info: DeliveryInfo,
    ) -> Result<Order, DomainError> {
        let cart = self.carts.fetch_cart(cart_id).await?;
        let order = Order::from_cart(cart, customer_info, delivery_info);
        let saved = self.store.save(order).await?;

        log::info!(
            "Created order {} from cart {} with {} products",
            saved.order_id,
            cart_id,
            saved.products.len()
        );
        Ok(saved)
    }

    pub async fn retrieve_order(&self, order_id: Uuid) -> Result<Order, DomainError> {
        self.find_existing(order_id).await
    }

    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), DomainError> {
        let order = self.find_existing(order_id).await?;
        self.store.delete_by_order_id(order.order_id).await?;

        log::info!("Deleted order {}", order_id);
        Ok(())
    }

    /// Marks the order as paid. Finalizing a paid order succeeds without
    /// changing it.
    pub async fn finalize_order(&self, order_id: Uuid) -> Result<Order, DomainError> {
        let mut order = self.find_existing(order_id).await?;

        if order.mark_paid() {
            log::info!("Order {} paid", order_id);
        } else {
            log::debug!("Order {} already paid, nothing to do", order_id);
        }

        self.store.save(order).await
    }

    /// Decodes `payload` as a JSON array of order records and returns a lazy
    /// stream saving them one at a time, in input order. Each record gets a
    /// fresh id and insertion time. Decoding failures reject the whole
    /// payload before anything is saved.
    pub fn import_orders(
        &self,
        payload: &[u8],
    ) -> Result<BoxStream<'_, Result<Order, DomainError>>, DomainError> {
        let records: Vec<OrderRecord> = serde_json::from_slice(payload)
            .map_err(|e| DomainError::MalformedInput(e.to_string()))?;

        log::info!(
            "Importing {} orders (failure policy: {})",
            records.len(),
            self.import_policy
        );

        let abort_on_failure = self.import_policy == ImportFailurePolicy::Abort;
        let saves = stream::unfold(
            (records.into_iter(), false),
            move |(mut records, stopped)| async move {
                if stopped {
                    return None;
                }
                let record = records.next()?;
                let result = self.store.save(record.into_order()).await;
                if let Err(e) = &result {
                    log::warn!("Failed to import order record: {}", e);
                }
                let stopped = abort_on_failure && result.is_err();
                Some((result, (records, stopped)))
            },
        );

        Ok(saves.boxed())
    }

    /// Deletes orders inserted more than `retention` ago. Returns how many
    /// were removed.
    pub async fn purge_stale(&self, retention: Duration) -> Result<usize, DomainError> {
        let now = now();
        let inserted_before = cutoff(now, retention)?;
        let updated_before = cutoff(now, self.purge_grace)?;

        let removed = self
            .store
            .delete_inserted_before(inserted_before, updated_before)
            .await?;

        log::debug!(
            "Purged {} orders inserted before {}",
            removed,
            inserted_before
        );
        Ok(removed)
    }

    async fn find_existing(&self, order_id: Uuid) -> Result<Order, DomainError> {
        self.store
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(DomainError::order_not_found)
    }
}

/// `now - window`, or `MalformedInput` when the window does not fit the
/// calendar.
fn cutoff(now: DateTime<Utc>, window: Duration) -> Result<DateTime<Utc>, DomainError> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| {
            DomainError::MalformedInput(format!("time window of {window:?} is out of range"))
        })
}
