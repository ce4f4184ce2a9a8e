use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;

use super::errors::DomainError;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_DELIVERED: &str = "delivered";

/// Money columns are `NUMERIC(12, 2)`.
pub const PRICE_SCALE: i64 = 2;

/// Current time at the microsecond precision of `TIMESTAMPTZ`, so a saved
/// order reads back equal to the one in memory.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// One product line of an order.
///
/// `id` and `order_id` are assigned by the store when the owning order is
/// saved; any value set by the caller for `order_id` is overwritten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub id: Option<String>,
    pub order_id: Option<String>,
    pub product_id: String,
    pub product_name: String,
    pub selected_size: String,
    pub selected_color: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

impl OrderItem {
    /// Builds an unsaved line, pricing it at `unit_price * quantity`.
    pub fn priced(input: OrderItemInput) -> Self {
        let line_total = &input.unit_price * BigDecimal::from(input.quantity);
        Self {
            id: None,
            order_id: None,
            product_id: input.product_id,
            product_name: input.product_name,
            selected_size: input.selected_size,
            selected_color: input.selected_color,
            quantity: input.quantity,
            unit_price: input.unit_price,
            line_total,
        }
    }
}

/// A customer's purchase. `status` is an open string; values other than
/// `pending`, `completed` and `delivered` are stored as given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: Option<String>,
    pub user_id: String,
    pub status: String,
    pub payment_method: String,
    pub delivery_method: String,
    pub delivery_address: String,
    pub comment: String,
    pub subtotal: BigDecimal,
    pub delivery_fee: BigDecimal,
    pub total: BigDecimal,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Prices `input` into a new `pending` order stamped with `now`,
    /// truncated to microseconds.
    ///
    /// The subtotal is the sum of the line totals, the delivery fee is always
    /// zero and the total equals the subtotal.
    pub fn pending(input: CreateOrderInput, now: DateTime<Utc>) -> Self {
        let now = now.trunc_subsecs(6);
        let items: Vec<OrderItem> = input.items.into_iter().map(OrderItem::priced).collect();
        let subtotal = items
            .iter()
            .fold(BigDecimal::zero(), |acc, item| acc + &item.line_total);
        let delivery_fee = BigDecimal::zero();
        let total = &subtotal + &delivery_fee;

        Self {
            id: None,
            user_id: input.user_id,
            status: STATUS_PENDING.to_string(),
            payment_method: input.payment_method,
            delivery_method: input.delivery_method,
            delivery_address: input.delivery_address,
            comment: input.comment,
            subtotal,
            delivery_fee,
            total,
            items,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: String,
    pub product_name: String,
    pub selected_size: String,
    pub selected_color: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub user_id: String,
    pub payment_method: String,
    pub delivery_method: String,
    pub delivery_address: String,
    pub comment: String,
    pub items: Vec<OrderItemInput>,
}

impl CreateOrderInput {
    /// Rejects malformed requests before any store is touched.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.user_id.trim().is_empty() {
            return Err(DomainError::Validation("user_id is required".into()));
        }
        if self.items.is_empty() {
            return Err(DomainError::Validation(
                "an order needs at least one item".into(),
            ));
        }
        for (idx, item) in self.items.iter().enumerate() {
            if item.product_id.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "items[{idx}]: product_id is required"
                )));
            }
            if item.quantity <= 0 {
                return Err(DomainError::Validation(format!(
                    "items[{idx}]: quantity must be positive, got {}",
                    item.quantity
                )));
            }
            if item.unit_price < BigDecimal::zero() {
                return Err(DomainError::Validation(format!(
                    "items[{idx}]: unit_price must not be negative, got {}",
                    item.unit_price
                )));
            }
            let (_, scale) = item.unit_price.normalized().as_bigint_and_exponent();
            if scale > PRICE_SCALE {
                return Err(DomainError::Validation(format!(
                    "items[{idx}]: unit_price has more than {PRICE_SCALE} decimal places, got {}",
                    item.unit_price
                )));
            }
        }
        Ok(())
    }
}
