use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};

use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, STATUS_COMPLETED, STATUS_DELIVERED, STATUS_PENDING};
use crate::domain::ports::{OrderStore, ProductStore, UserStore};
use crate::domain::stats::{DailyBuckets, DailyRevenue, DashboardStats, ProductSales};

pub const DEFAULT_STATS_TTL: Duration = Duration::from_secs(15);

const REVENUE_DAYS: usize = 30;
const TOP_PRODUCTS: usize = 10;
const RECENT_ORDERS: usize = 10;

/// The single cached dashboard snapshot.
#[derive(Debug)]
enum StatsCache {
    Empty,
    Filled {
        stats: Arc<DashboardStats>,
        expires_at: Instant,
    },
}

impl StatsCache {
    fn fresh(&self, now: Instant) -> Option<Arc<DashboardStats>> {
        match self {
            StatsCache::Filled { stats, expires_at } if now < *expires_at => Some(stats.clone()),
            _ => None,
        }
    }
}

/// Rolls orders, products and users up into dashboard statistics.
///
/// Concurrent callers that all find the cache stale each recompute and
/// publish; the last writer wins. Nobody waits on another caller's
/// recomputation.
pub struct AnalyticsService {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    users: Arc<dyn UserStore>,
    ttl: Duration,
    cache: RwLock<StatsCache>,
}

impl AnalyticsService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            orders,
            products,
            users,
            ttl: DEFAULT_STATS_TTL,
            cache: RwLock::new(StatsCache::Empty),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the cached snapshot while it is fresh, otherwise recomputes
    /// it from the stores and publishes the result.
    pub fn dashboard_stats(&self) -> Result<Arc<DashboardStats>, DomainError> {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(stats) = cache.fresh(Instant::now()) {
                log::debug!("Dashboard stats served from cache");
                return Ok(stats);
            }
        }

        log::debug!("Dashboard stats cache miss, recomputing");
        let stats = Arc::new(self.compute()?);

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        *cache = StatsCache::Filled {
            stats: stats.clone(),
            expires_at: Instant::now() + self.ttl,
        };
        Ok(stats)
    }

    /// Daily revenue for orders created within `[start, end]`, ascending by
    /// date. Always reads the store; the dashboard cache is not involved.
    pub fn revenue_by_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DailyRevenue>, DomainError> {
        let orders = self.orders.find_all()?;

        let mut buckets = DailyBuckets::default();
        for order in orders
            .iter()
            .filter(|o| o.created_at >= start && o.created_at <= end)
        {
            buckets.add(order);
        }
        Ok(buckets.into_sorted())
    }

    /// User count for the dashboard. A failing user directory counts as zero
    /// users rather than failing the whole dashboard.
    pub fn user_count_or_zero(&self) -> i64 {
        match self.users.count() {
            Ok(n) => n,
            Err(e) => {
                log::warn!("Counting users failed, reporting 0: {}", e);
                0
            }
        }
    }

    fn compute(&self) -> Result<DashboardStats, DomainError> {
        let orders = self.orders.find_all()?;
        let products = self.products.find_all()?;
        let total_users = self.user_count_or_zero();
        Ok(aggregate(orders, &products, total_users))
    }
}

/// Folds the full order history into a snapshot.
///
/// `orders` must be sorted newest first; the recent-orders list is taken
/// from its head.
fn aggregate(orders: Vec<Order>, products: &[Product], total_users: i64) -> DashboardStats {
    let catalog: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut total_revenue = BigDecimal::zero();
    let mut pending_orders = 0;
    let mut completed_orders = 0;
    let mut orders_by_status: BTreeMap<String, i64> = BTreeMap::new();
    let mut sales_by_category: BTreeMap<String, BigDecimal> = BTreeMap::new();
    let mut daily = DailyBuckets::default();
    let mut sales: HashMap<&str, ProductSales> = HashMap::new();

    for order in &orders {
        total_revenue += &order.total;
        *orders_by_status.entry(order.status.clone()).or_default() += 1;
        match order.status.as_str() {
            STATUS_PENDING => pending_orders += 1,
            STATUS_COMPLETED | STATUS_DELIVERED => completed_orders += 1,
            _ => {}
        }
        daily.add(order);

        for item in &order.items {
            let entry = sales
                .entry(item.product_id.as_str())
                .or_insert_with(|| ProductSales {
                    product_id: item.product_id.clone(),
                    product_name: String::new(),
                    total_sold: 0,
                    revenue: BigDecimal::zero(),
                });
            if entry.product_name.is_empty() {
                entry.product_name = if item.product_name.is_empty() {
                    catalog
                        .get(item.product_id.as_str())
                        .map(|p| p.name.clone())
                        .unwrap_or_default()
                } else {
                    item.product_name.clone()
                };
            }
            entry.total_sold += i64::from(item.quantity);
            entry.revenue += &item.line_total;

            if let Some(product) = catalog.get(item.product_id.as_str()) {
                if !product.category.is_empty() {
                    *sales_by_category
                        .entry(product.category.clone())
                        .or_insert_with(BigDecimal::zero) += &item.line_total;
                }
            }
        }
    }

    let mut top_products: Vec<ProductSales> = sales.into_values().collect();
    top_products.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    top_products.truncate(TOP_PRODUCTS);

    let total_orders = orders.len() as i64;
    let mut recent_orders = orders;
    recent_orders.truncate(RECENT_ORDERS);

    DashboardStats {
        total_revenue,
        total_orders,
        total_products: products.len() as i64,
        total_users,
        pending_orders,
        completed_orders,
        revenue_by_day: daily.into_most_recent(REVENUE_DAYS),
        top_products,
        recent_orders,
        orders_by_status,
        sales_by_category,
    }
}
