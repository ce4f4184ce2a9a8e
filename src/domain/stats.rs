use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

use super::order::Order;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    /// Calendar day of the order's creation time, `YYYY-MM-DD`.
    pub date: String,
    pub revenue: BigDecimal,
    pub orders: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub product_id: String,
    pub product_name: String,
    pub total_sold: i64,
    pub revenue: BigDecimal,
}

/// Point-in-time dashboard snapshot. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_revenue: BigDecimal,
    pub total_orders: i64,
    pub total_products: i64,
    pub total_users: i64,
    pub pending_orders: i64,
    pub completed_orders: i64,
    pub revenue_by_day: Vec<DailyRevenue>,
    pub top_products: Vec<ProductSales>,
    pub recent_orders: Vec<Order>,
    pub orders_by_status: BTreeMap<String, i64>,
    pub sales_by_category: BTreeMap<String, BigDecimal>,
}

/// Accumulates revenue and order counts per creation day.
///
/// Keys are `YYYY-MM-DD` strings, so iteration order is ascending by date.
#[derive(Debug, Default)]
pub struct DailyBuckets {
    days: BTreeMap<String, DailyRevenue>,
}

impl DailyBuckets {
    pub fn add(&mut self, order: &Order) {
        let date = order.created_at.format("%Y-%m-%d").to_string();
        let bucket = self
            .days
            .entry(date.clone())
            .or_insert_with(|| DailyRevenue {
                date,
                revenue: BigDecimal::zero(),
                orders: 0,
            });
        bucket.revenue += &order.total;
        bucket.orders += 1;
    }

    /// Ascending by date.
    pub fn into_sorted(self) -> Vec<DailyRevenue> {
        self.days.into_values().collect()
    }

    /// Ascending by date, keeping only the `limit` most recent days.
    pub fn into_most_recent(self, limit: usize) -> Vec<DailyRevenue> {
        let mut days = self.into_sorted();
        let skip = days.len().saturating_sub(limit);
        days.drain(..skip);
        days
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::order::tests::{input, item};

    fn order_on(day: u32, total: &str) -> Order {
        let mut order = Order::pending(
            input("u1", vec![item("p1", 1, total)]),
            Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
        );
        order.id = Some(format!("o-{day}-{total}"));
        order
    }

    #[test]
    fn buckets_group_orders_by_day_ascending() {
        let mut buckets = DailyBuckets::default();
        for order in [order_on(2, "50"), order_on(1, "100"), order_on(2, "30")] {
            buckets.add(&order);
        }

        let days = buckets.into_sorted();

        assert_eq!(
            days,
            vec![
                DailyRevenue {
                    date: "2024-01-01".into(),
                    revenue: BigDecimal::from(100),
                    orders: 1,
                },
                DailyRevenue {
                    date: "2024-01-02".into(),
                    revenue: BigDecimal::from_str("80").unwrap(),
                    orders: 2,
                },
            ]
        );
    }

    #[test]
    fn most_recent_keeps_the_tail() {
        let mut buckets = DailyBuckets::default();
        for day in 1..=5 {
            buckets.add(&order_on(day, "1"));
        }

        let days = buckets.into_most_recent(3);

        let dates: Vec<&str> = days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-03", "2024-01-04", "2024-01-05"]);
    }

    #[test]
    fn most_recent_with_fewer_days_than_limit_keeps_all() {
        let mut buckets = DailyBuckets::default();
        buckets.add(&order_on(1, "1"));
        assert_eq!(buckets.into_most_recent(30).len(), 1);
    }
}
