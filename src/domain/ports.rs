use super::catalog::{Product, User};
use super::errors::DomainError;
use super::order::Order;

pub trait OrderStore: Send + Sync + 'static {
    /// Persists the order together with its items as one unit and returns
    /// the order's identity.
    ///
    /// An order without an identity gets one assigned. Every item's
    /// `order_id` is overwritten with that identity, and re-saving an order
    /// replaces its previously stored items.
    fn save(&self, order: &mut Order) -> Result<String, DomainError>;

    /// Orders of one user, newest first, items included.
    fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>, DomainError>;

    /// All orders, newest first, items included.
    fn find_all(&self) -> Result<Vec<Order>, DomainError>;

    /// `Ok(None)` when the identity is unknown or malformed.
    fn find_by_id(&self, id: &str) -> Result<Option<Order>, DomainError>;

    /// Sets status and update timestamp only. Unknown identities are a no-op.
    fn update_status(&self, id: &str, status: &str) -> Result<(), DomainError>;
}

pub trait ProductStore: Send + Sync + 'static {
    fn find_all(&self) -> Result<Vec<Product>, DomainError>;
    fn find_by_id(&self, id: &str) -> Result<Option<Product>, DomainError>;
}

pub trait UserStore: Send + Sync + 'static {
    fn find_by_id(&self, id: &str) -> Result<Option<User>, DomainError>;
    fn count(&self) -> Result<i64, DomainError>;
}
