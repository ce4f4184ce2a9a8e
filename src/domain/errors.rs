use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Product not found: {0}")]
    ProductNotFound(String),
    #[error("Store error: {0}")]
    Store(String),
}
