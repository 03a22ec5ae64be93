use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl DomainError {
    pub fn order_not_found() -> Self {
        DomainError::NotFound("Order not found".to_string())
    }

    pub fn cart_not_found() -> Self {
        DomainError::NotFound("Shopping cart not found".to_string())
    }

    /// Stable machine-readable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::NotFound(_) => "not_found",
            DomainError::Upstream(_) => "upstream_error",
            DomainError::Storage(_) => "storage_error",
            DomainError::MalformedInput(_) => "malformed_input",
        }
    }
}
