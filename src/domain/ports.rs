use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::order::{Order, ShoppingCart};

/// Blocking persistence port. Implementations may hold a connection for the
/// duration of a call; callers on an async runtime go through
/// [`OrderStore`] instead.
pub trait OrderRepository: Send + Sync + 'static {
    fn find_by_order_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    /// Inserts the order or replaces the stored one with the same id.
    fn save(&self, order: &Order) -> Result<Order, DomainError>;
    fn delete_by_order_id(&self, id: Uuid) -> Result<(), DomainError>;
    /// Deletes orders inserted before `inserted_before` whose last mutation
    /// is also before `updated_before`. Returns the number removed.
    fn delete_inserted_before(
        &self,
        inserted_before: DateTime<Utc>,
        updated_before: DateTime<Utc>,
    ) -> Result<usize, DomainError>;
}

/// Non-blocking persistence port used by the orchestrator.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_order_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    async fn save(&self, order: Order) -> Result<Order, DomainError>;
    async fn delete_by_order_id(&self, id: Uuid) -> Result<(), DomainError>;
    async fn delete_inserted_before(
        &self,
        inserted_before: DateTime<Utc>,
        updated_before: DateTime<Utc>,
    ) -> Result<usize, DomainError>;
}

#[async_trait]
pub trait CartFetcher: Send + Sync {
    /// Fails with [`DomainError::NotFound`] when the cart service does not
    /// know the cart and [`DomainError::Upstream`] for anything else.
    async fn fetch_cart(&self, cart_id: Uuid) -> Result<ShoppingCart, DomainError>;
}
