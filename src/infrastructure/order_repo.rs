use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{now_micros, Order};
use crate::domain::ports::OrderStore;
use crate::schema::{order_items, orders};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Store(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Store(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderStore {
    pool: DbPool,
}

impl DieselOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Loads the orders matching `user_id` (all orders when `None`), newest
    /// first, then their items in a single batch and stitches them back.
    fn load_orders(&self, user_id: Option<&str>) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = orders::table
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .into_boxed();
        if let Some(user_id) = user_id {
            query = query.filter(orders::user_id.eq(user_id));
        }
        let rows = query.load(&mut conn)?;

        let items = OrderItemRow::belonging_to(&rows)
            .select(OrderItemRow::as_select())
            .order(order_items::line_no.asc())
            .load(&mut conn)?;

        Ok(items
            .grouped_by(&rows)
            .into_iter()
            .zip(rows)
            .map(|(items, row)| row.into_order(items))
            .collect())
    }
}

fn write_items(conn: &mut PgConnection, order_id: Uuid, order: &mut Order) -> QueryResult<()> {
    let item_ids: Vec<Uuid> = order
        .items
        .iter_mut()
        .map(|item| {
            let id = item
                .id
                .as_deref()
                .and_then(|id| Uuid::parse_str(id).ok())
                .unwrap_or_else(Uuid::new_v4);
            item.id = Some(id.to_string());
            item.order_id = Some(order_id.to_string());
            id
        })
        .collect();

    let rows = order
        .items
        .iter()
        .zip(item_ids)
        .enumerate()
        .map(|(line_no, (item, id))| NewOrderItemRow {
            id,
            order_id,
            line_no: line_no as i32,
            product_id: &item.product_id,
            product_name: &item.product_name,
            selected_size: &item.selected_size,
            selected_color: &item.selected_color,
            quantity: item.quantity,
            unit_price: &item.unit_price,
            line_total: &item.line_total,
        })
        .collect::<Vec<_>>();
    if rows.is_empty() {
        return Ok(());
    }

    diesel::insert_into(order_items::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

impl OrderStore for DieselOrderStore {
    fn save(&self, order: &mut Order) -> Result<String, DomainError> {
        let order_id = match order.id.as_deref() {
            Some(id) => Uuid::parse_str(id)
                .map_err(|e| DomainError::Validation(format!("malformed order id '{id}': {e}")))?,
            None => Uuid::new_v4(),
        };
        order.updated_at = now_micros();

        let mut conn = self.pool.get()?;

        // Order row and items commit or roll back together; re-saving an
        // order replaces its items.
        conn.transaction::<_, DomainError, _>(|conn| {
            let row = NewOrderRow::from_order(order_id, order);
            diesel::insert_into(orders::table)
                .values(&row)
                .on_conflict(orders::id)
                .do_update()
                .set(&row)
                .execute(conn)?;

            diesel::delete(order_items::table.filter(order_items::order_id.eq(order_id)))
                .execute(conn)?;
            write_items(conn, order_id, order)?;
            Ok(())
        })?;

        let id = order_id.to_string();
        order.id = Some(id.clone());
        Ok(id)
    }

    fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>, DomainError> {
        self.load_orders(Some(user_id))
    }

    fn find_all(&self) -> Result<Vec<Order>, DomainError> {
        self.load_orders(None)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Order>, DomainError> {
        let Ok(order_id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let mut conn = self.pool.get()?;

        let order = orders::table
            .find(order_id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = OrderItemRow::belonging_to(&order)
            .select(OrderItemRow::as_select())
            .order(order_items::line_no.asc())
            .load(&mut conn)?;

        Ok(Some(order.into_order(items)))
    }

    fn update_status(&self, id: &str, status: &str) -> Result<(), DomainError> {
        let Ok(order_id) = Uuid::parse_str(id) else {
            log::debug!("Ignoring status update for malformed order id {:?}", id);
            return Ok(());
        };
        let mut conn = self.pool.get()?;

        diesel::update(orders::table.find(order_id))
            .set((orders::status.eq(status), orders::updated_at.eq(now_micros())))
            .execute(&mut conn)?;
        Ok(())
    }
}
