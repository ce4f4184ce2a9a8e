use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::catalog::{Product, User};
use crate::domain::order::{Order, OrderItem};
use crate::schema::{order_items, orders, products, users};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: String,
    pub status: String,
    pub payment_method: String,
    pub delivery_method: String,
    pub delivery_address: String,
    pub comment: String,
    pub subtotal: BigDecimal,
    pub delivery_fee: BigDecimal,
    pub total: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub fn into_order(self, items: Vec<OrderItemRow>) -> Order {
        Order {
            id: Some(self.id.to_string()),
            user_id: self.user_id,
            status: self.status,
            payment_method: self.payment_method,
            delivery_method: self.delivery_method,
            delivery_address: self.delivery_address,
            comment: self.comment,
            subtotal: self.subtotal,
            delivery_fee: self.delivery_fee,
            total: self.total,
            items: items.into_iter().map(OrderItemRow::into_item).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Full order record, used both to insert and, on conflict, to overwrite.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    pub id: Uuid,
    pub user_id: &'a str,
    pub status: &'a str,
    pub payment_method: &'a str,
    pub delivery_method: &'a str,
    pub delivery_address: &'a str,
    pub comment: &'a str,
    pub subtotal: &'a BigDecimal,
    pub delivery_fee: &'a BigDecimal,
    pub total: &'a BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewOrderRow<'a> {
    pub fn from_order(id: Uuid, order: &'a Order) -> Self {
        Self {
            id,
            user_id: &order.user_id,
            status: &order.status,
            payment_method: &order.payment_method,
            delivery_method: &order.delivery_method,
            delivery_address: &order.delivery_address,
            comment: &order.comment,
            subtotal: &order.subtotal,
            delivery_fee: &order.delivery_fee,
            total: &order.total,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub line_no: i32,
    pub product_id: String,
    pub product_name: String,
    pub selected_size: String,
    pub selected_color: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

impl OrderItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            id: Some(self.id.to_string()),
            order_id: Some(self.order_id.to_string()),
            product_id: self.product_id,
            product_name: self.product_name,
            selected_size: self.selected_size,
            selected_color: self.selected_color,
            quantity: self.quantity,
            unit_price: self.unit_price,
            line_total: self.line_total,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow<'a> {
    pub id: Uuid,
    pub order_id: Uuid,
    pub line_no: i32,
    pub product_id: &'a str,
    pub product_name: &'a str,
    pub selected_size: &'a str,
    pub selected_color: &'a str,
    pub quantity: i32,
    pub unit_price: &'a BigDecimal,
    pub line_total: &'a BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: BigDecimal,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            category: row.category,
            price: row.price,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub category: &'a str,
    pub price: &'a BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub name: &'a str,
}
