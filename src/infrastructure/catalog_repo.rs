use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::catalog::{Product, User};
use crate::domain::errors::DomainError;
use crate::domain::ports::{ProductStore, UserStore};
use crate::schema::{products, users};

use super::models::{NewProductRow, NewUserRow, ProductRow, UserRow};

pub struct DieselProductStore {
    pool: DbPool,
}

impl DieselProductStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Inserts or overwrites a catalog entry.
    pub fn upsert(&self, product: &Product) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let row = NewProductRow {
            id: &product.id,
            name: &product.name,
            category: &product.category,
            price: &product.price,
        };
        diesel::insert_into(products::table)
            .values(&row)
            .on_conflict(products::id)
            .do_update()
            .set((
                products::name.eq(row.name),
                products::category.eq(row.category),
                products::price.eq(row.price),
            ))
            .execute(&mut conn)?;
        Ok(())
    }
}

impl ProductStore for DieselProductStore {
    fn find_all(&self) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = products::table
            .select(ProductRow::as_select())
            .order(products::created_at.desc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }
}

pub struct DieselUserStore {
    pool: DbPool,
}

impl DieselUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn insert(&self, user: &User) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(users::table)
            .values(&NewUserRow {
                id: &user.id,
                email: &user.email,
                name: &user.name,
            })
            .execute(&mut conn)?;
        Ok(())
    }
}

impl UserStore for DieselUserStore {
    fn find_by_id(&self, id: &str) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = users::table
            .find(id)
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(User::from))
    }

    fn count(&self) -> Result<i64, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(users::table.count().get_result(&mut conn)?)
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::infrastructure::order_repo::tests::setup_db;

    #[tokio::test]
    #[ignore = "requires a container runtime for PostgreSQL"]
    async fn product_upsert_and_lookup() {
        let (_container, pool) = setup_db().await;
        let store = DieselProductStore::new(pool);
        let mut product = Product {
            id: "sku-1".into(),
            name: "Tee".into(),
            category: "shirts".into(),
            price: BigDecimal::from(12),
        };

        store.upsert(&product).expect("insert failed");
        product.name = "Plain Tee".into();
        store.upsert(&product).expect("update failed");

        let found = store
            .find_by_id("sku-1")
            .expect("find failed")
            .expect("product should exist");
        assert_eq!(found.name, "Plain Tee");
        assert_eq!(store.find_all().expect("find_all failed").len(), 1);
        assert!(store.find_by_id("sku-2").expect("find failed").is_none());
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for PostgreSQL"]
    async fn user_lookup_and_count() {
        let (_container, pool) = setup_db().await;
        let store = DieselUserStore::new(pool);
        assert_eq!(store.count().expect("count failed"), 0);

        store
            .insert(&User {
                id: "u1".into(),
                email: "u1@example.com".into(),
                name: "U One".into(),
            })
            .expect("insert failed");

        assert_eq!(store.count().expect("count failed"), 1);
        assert!(store.find_by_id("u1").expect("find failed").is_some());
        assert!(store.find_by_id("u2").expect("find failed").is_none());
    }
}
