use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use uuid::Uuid;

use crate::domain::catalog::{Product, User};
use crate::domain::errors::DomainError;
use crate::domain::order::{now_micros, Order};
use crate::domain::ports::{OrderStore, ProductStore, UserStore};

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct StoredOrder {
    seq: u64,
    order: Order,
}

#[derive(Debug, Default)]
struct OrderTable {
    next_seq: u64,
    rows: HashMap<String, StoredOrder>,
}

/// Process-local `OrderStore` used by tests and by the e2e harness.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    table: RwLock<OrderTable>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<&StoredOrder> = table.rows.values().filter(|r| keep(&r.order)).collect();
        // Newest first; insertion order breaks ties between equal timestamps.
        rows.sort_by(|a, b| {
            b.order
                .created_at
                .cmp(&a.order.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        rows.into_iter().map(|r| r.order.clone()).collect()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn save(&self, order: &mut Order) -> Result<String, DomainError> {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);

        let id = order
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        order.updated_at = now_micros();
        for item in &mut order.items {
            item.order_id = Some(id.clone());
            item.id.get_or_insert_with(|| Uuid::new_v4().to_string());
        }

        let seq = match table.rows.get(&id) {
            Some(existing) => existing.seq,
            None => {
                table.next_seq += 1;
                table.next_seq
            }
        };
        table.rows.insert(
            id.clone(),
            StoredOrder {
                seq,
                order: order.clone(),
            },
        );
        Ok(id)
    }

    fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>, DomainError> {
        Ok(self.sorted(|o| o.user_id == user_id))
    }

    fn find_all(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.sorted(|_| true))
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Order>, DomainError> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table.rows.get(id).map(|r| r.order.clone()))
    }

    fn update_status(&self, id: &str, status: &str) -> Result<(), DomainError> {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(row) = table.rows.get_mut(id) {
            row.order.status = status.to_string();
            row.order.updated_at = now_micros();
        }
        Ok(())
    }
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product by id.
    pub fn insert(&self, product: Product) {
        let mut products = self
            .products
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        products.retain(|p| p.id != product.id);
        products.push(product);
    }
}

impl ProductStore for InMemoryProductStore {
    fn find_all(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Product>, DomainError> {
        let products = self.products.read().unwrap_or_else(PoisonError::into_inner);
        Ok(products.iter().find(|p| p.id == id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.id.clone(), user);
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_id(&self, id: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.get(id).cloned())
    }

    fn count(&self) -> Result<i64, DomainError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::domain::order::tests::{input, item};

    fn order_for(user_id: &str, minutes: i64) -> Order {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        Order::pending(
            input(user_id, vec![item("p1", 1, "5")]),
            base + Duration::minutes(minutes),
        )
    }

    #[test]
    fn save_assigns_identity_and_stamps_items() {
        let store = InMemoryOrderStore::new();
        let mut order = order_for("u1", 0);
        order.items[0].order_id = Some("caller-supplied".into());

        let id = store.save(&mut order).expect("save failed");

        assert_eq!(order.id.as_deref(), Some(id.as_str()));
        assert_eq!(order.items[0].order_id.as_deref(), Some(id.as_str()));
        assert!(order.items[0].id.is_some());
        assert_eq!(order.updated_at.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn find_all_is_newest_first() {
        let store = InMemoryOrderStore::new();
        for minutes in [5, 1, 9] {
            store
                .save(&mut order_for("u1", minutes))
                .expect("save failed");
        }

        let orders = store.find_all().expect("find_all failed");

        let stamps: Vec<_> = orders.iter().map(|o| o.created_at).collect();
        let mut expected = stamps.clone();
        expected.sort_by(|a, b| b.cmp(a));
        assert_eq!(stamps, expected);
    }

    #[test]
    fn find_by_user_filters_and_orders() {
        let store = InMemoryOrderStore::new();
        store.save(&mut order_for("u1", 1)).expect("save failed");
        store.save(&mut order_for("u2", 2)).expect("save failed");
        store.save(&mut order_for("u1", 3)).expect("save failed");

        let orders = store.find_by_user("u1").expect("find failed");

        assert_eq!(orders.len(), 2);
        assert!(orders[0].created_at > orders[1].created_at);
        assert!(orders.iter().all(|o| o.user_id == "u1"));
    }

    #[test]
    fn resave_replaces_items_instead_of_duplicating() {
        let store = InMemoryOrderStore::new();
        let mut order = order_for("u1", 0);
        let id = store.save(&mut order).expect("first save failed");
        store.save(&mut order).expect("second save failed");

        let stored = store.find_by_id(&id).expect("find failed").expect("exists");

        assert_eq!(stored.items.len(), 1);
        assert_eq!(store.find_all().expect("find_all failed").len(), 1);
    }

    #[test]
    fn update_status_on_unknown_id_is_a_noop() {
        let store = InMemoryOrderStore::new();
        store
            .update_status("missing", "completed")
            .expect("should not error");
        assert!(store.find_by_id("missing").expect("find failed").is_none());
    }

    #[test]
    fn update_status_changes_only_status_and_timestamp() {
        let store = InMemoryOrderStore::new();
        let mut order = order_for("u1", 0);
        let id = store.save(&mut order).expect("save failed");

        store.update_status(&id, "shipped").expect("update failed");

        let stored = store.find_by_id(&id).expect("find failed").expect("exists");
        assert_eq!(stored.status, "shipped");
        assert_eq!(stored.total, order.total);
        assert_eq!(stored.items, order.items);
    }

    #[test]
    fn user_count_reflects_inserts() {
        let users = InMemoryUserStore::new();
        for id in ["a", "b", "a"] {
            users.insert(User {
                id: id.into(),
                email: format!("{id}@example.com"),
                name: id.into(),
            });
        }
        assert_eq!(users.count().expect("count failed"), 2);
    }
}
