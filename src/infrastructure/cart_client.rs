use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::ShoppingCart;
use crate::domain::ports::CartFetcher;

impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        DomainError::Upstream(e.to_string())
    }
}

/// Reads carts from the shopping service with `GET {base_url}/{cart_id}`.
pub struct HttpCartClient {
    client: Client,
    base_url: String,
}

impl HttpCartClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CartFetcher for HttpCartClient {
    async fn fetch_cart(&self, cart_id: Uuid) -> Result<ShoppingCart, DomainError> {
        let url = format!("{}/{}", self.base_url, cart_id);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        log::debug!("Shopping service answered {} for cart {}", status, cart_id);

        if status.is_client_error() {
            return Err(DomainError::cart_not_found());
        }
        if !status.is_success() {
            return Err(DomainError::Upstream(format!(
                "shopping service responded with {}",
                status
            )));
        }

        Ok(response.json::<ShoppingCart>().await?)
    }
}
