use std::sync::Arc;

use chrono::Utc;

use crate::domain::errors::DomainError;
use crate::domain::order::{CreateOrderInput, Order};
use crate::domain::ports::{OrderStore, ProductStore, UserStore};

/// Validates, prices and persists orders.
///
/// The user and product directories are optional: when one is not
/// configured, the corresponding existence check is skipped.
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    products: Option<Arc<dyn ProductStore>>,
    users: Option<Arc<dyn UserStore>>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self {
            orders,
            products: None,
            users: None,
        }
    }

    pub fn with_products(mut self, products: Arc<dyn ProductStore>) -> Self {
        self.products = Some(products);
        self
    }

    pub fn with_users(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = Some(users);
        self
    }

    /// Creates a `pending` order from caller-supplied lines.
    ///
    /// Unit prices are trusted as given; they are not re-read from the
    /// catalog.
    pub fn create(&self, input: CreateOrderInput) -> Result<Order, DomainError> {
        input.validate()?;

        if let Some(users) = &self.users {
            if users.find_by_id(&input.user_id)?.is_none() {
                return Err(DomainError::UserNotFound(input.user_id));
            }
        }

        if let Some(products) = &self.products {
            for item in &input.items {
                if products.find_by_id(&item.product_id)?.is_none() {
                    return Err(DomainError::ProductNotFound(item.product_id.clone()));
                }
            }
        }

        let mut order = Order::pending(input, Utc::now());
        let id = self.orders.save(&mut order)?;
        log::info!(
            "Created order {} for user {} with {} item(s), total {}",
            id,
            order.user_id,
            order.items.len(),
            order.total
        );
        Ok(order)
    }

    /// Writes the status through without checking the value or that the
    /// order exists.
    pub fn update_status(&self, order_id: &str, status: &str) -> Result<(), DomainError> {
        self.orders.update_status(order_id, status)?;
        log::info!("Order {} status set to {:?}", order_id, status);
        Ok(())
    }

    pub fn get_by_id(&self, order_id: &str) -> Result<Option<Order>, DomainError> {
        self.orders.find_by_id(order_id)
    }

    pub fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, DomainError> {
        self.orders.find_by_user(user_id)
    }

    pub fn list_all(&self) -> Result<Vec<Order>, DomainError> {
        self.orders.find_all()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::catalog::{Product, User};
    use crate::domain::order::tests::{input, item};
    use crate::domain::order::STATUS_PENDING;
    use crate::infrastructure::memory::{
        InMemoryOrderStore, InMemoryProductStore, InMemoryUserStore,
    };

    struct Fixture {
        orders: Arc<InMemoryOrderStore>,
        service: OrderService,
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn fixture() -> Fixture {
        let orders = Arc::new(InMemoryOrderStore::new());
        let products = Arc::new(InMemoryProductStore::new());
        for id in ["p1", "p2"] {
            products.insert(Product {
                id: id.into(),
                name: format!("Product {id}"),
                category: "shirts".into(),
                price: dec("10"),
            });
        }
        let users = Arc::new(InMemoryUserStore::new());
        users.insert(User {
            id: "u1".into(),
            email: "u1@example.com".into(),
            name: "U One".into(),
        });

        let service = OrderService::new(orders.clone())
            .with_products(products)
            .with_users(users);
        Fixture { orders, service }
    }

    #[test]
    fn create_prices_and_persists_the_order() {
        let fx = fixture();

        let order = fx
            .service
            .create(input("u1", vec![item("p1", 2, "10"), item("p2", 1, "5")]))
            .expect("create failed");

        assert_eq!(order.subtotal, dec("25"));
        assert_eq!(order.total, dec("25"));
        assert_eq!(order.status, STATUS_PENDING);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].line_total, dec("20"));
        assert_eq!(order.items[1].line_total, dec("5"));

        let id = order.id.clone().expect("id assigned");
        let stored = fx
            .service
            .get_by_id(&id)
            .expect("get failed")
            .expect("exists");
        assert_eq!(stored, order);
        assert!(stored
            .items
            .iter()
            .all(|i| i.order_id.as_deref() == Some(id.as_str())));
    }

    #[test]
    fn create_trusts_the_caller_price() {
        let fx = fixture();

        let order = fx
            .service
            .create(input("u1", vec![item("p1", 3, "1.50")]))
            .expect("create failed");

        assert_eq!(order.total, dec("4.50"));
    }

    #[test]
    fn create_with_unknown_user_fails_without_persisting() {
        let fx = fixture();

        let err = fx
            .service
            .create(input("ghost", vec![item("p1", 1, "1")]))
            .unwrap_err();

        assert!(matches!(err, DomainError::UserNotFound(ref id) if id == "ghost"));
        assert!(fx.orders.find_all().expect("find_all failed").is_empty());
    }

    #[test]
    fn create_with_unknown_product_fails_without_persisting() {
        let fx = fixture();

        let err = fx
            .service
            .create(input("u1", vec![item("p1", 1, "1"), item("nope", 1, "1")]))
            .unwrap_err();

        assert!(matches!(err, DomainError::ProductNotFound(ref id) if id == "nope"));
        assert!(fx.orders.find_all().expect("find_all failed").is_empty());
    }

    #[test]
    fn create_skips_directory_checks_when_not_configured() {
        let orders = Arc::new(InMemoryOrderStore::new());
        let service = OrderService::new(orders.clone());

        service
            .create(input("anyone", vec![item("anything", 1, "1")]))
            .expect("create failed");

        assert_eq!(orders.find_all().expect("find_all failed").len(), 1);
    }

    #[test]
    fn create_rejects_invalid_input_before_lookup() {
        let fx = fixture();

        let err = fx
            .service
            .create(input("ghost", vec![item("p1", -1, "1")]))
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn get_by_id_unknown_is_none() {
        let fx = fixture();
        let found = fx.service.get_by_id("missing").expect("get failed");
        assert!(found.is_none());
    }

    #[test]
    fn update_status_accepts_any_value() {
        let fx = fixture();
        let order = fx
            .service
            .create(input("u1", vec![item("p1", 1, "1")]))
            .expect("create failed");
        let id = order.id.expect("id assigned");

        fx.service
            .update_status(&id, "lost-in-transit")
            .expect("update failed");

        let stored = fx
            .service
            .get_by_id(&id)
            .expect("get failed")
            .expect("exists");
        assert_eq!(stored.status, "lost-in-transit");
    }

    #[test]
    fn list_by_user_returns_only_their_orders() {
        let fx = fixture();
        fx.service
            .create(input("u1", vec![item("p1", 1, "1")]))
            .expect("create failed");

        assert_eq!(fx.service.list_by_user("u1").expect("list failed").len(), 1);
        let others = fx.service.list_by_user("u2").expect("list failed");
        assert!(others.is_empty());
        assert_eq!(fx.service.list_all().expect("list failed").len(), 1);
    }
}
