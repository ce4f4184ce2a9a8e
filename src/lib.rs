pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::analytics_service::AnalyticsService;
use application::order_service::OrderService;
use infrastructure::catalog_repo::{DieselProductStore, DieselUserStore};
use infrastructure::order_repo::DieselOrderStore;

pub use config::Config;
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Services shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub analytics: Arc<AnalyticsService>,
}

impl AppState {
    pub fn new(orders: OrderService, analytics: AnalyticsService) -> Self {
        Self {
            orders: Arc::new(orders),
            analytics: Arc::new(analytics),
        }
    }

    /// Wires both services to the PostgreSQL-backed stores.
    pub fn with_database(pool: DbPool, config: &Config) -> Self {
        let orders = Arc::new(DieselOrderStore::new(pool.clone()));
        let products = Arc::new(DieselProductStore::new(pool.clone()));
        let users = Arc::new(DieselUserStore::new(pool));

        let order_service = OrderService::new(orders.clone())
            .with_products(products.clone())
            .with_users(users.clone());
        let analytics = AnalyticsService::new(orders, products, users).with_ttl(config.stats_ttl);
        Self::new(order_service, analytics)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::update_order_status,
        handlers::orders::list_orders,
        handlers::orders::list_user_orders,
        handlers::analytics::dashboard,
        handlers::analytics::top_products,
        handlers::analytics::orders_by_status,
        handlers::analytics::revenue,
    ),
    components(schemas(
        handlers::orders::CreateOrderRequest,
        handlers::orders::CreateOrderItemRequest,
        handlers::orders::UpdateStatusRequest,
        handlers::orders::UpdateStatusResponse,
    )),
    tags(
        (name = "orders", description = "Order lifecycle"),
        (name = "analytics", description = "Dashboard aggregates"),
    )
)]
pub struct ApiDoc;

/// Registers every route on an actix-web app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(handlers::orders::create_order))
            .route("", web::get().to(handlers::orders::list_orders))
            .route("/{id}", web::get().to(handlers::orders::get_order))
            .route(
                "/{id}/status",
                web::put().to(handlers::orders::update_order_status),
            ),
    )
    .route(
        "/users/{user_id}/orders",
        web::get().to(handlers::orders::list_user_orders),
    )
    .service(
        web::scope("/analytics")
            .route("/dashboard", web::get().to(handlers::analytics::dashboard))
            .route(
                "/top-products",
                web::get().to(handlers::analytics::top_products),
            )
            .route(
                "/orders-by-status",
                web::get().to(handlers::analytics::orders_by_status),
            )
            .route("/revenue", web::get().to(handlers::analytics::revenue)),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let listener = TcpListener::bind((host, port))?;
    build_server_on(state, listener)
}

/// Same as [`build_server`] but serves on an already bound listener.
pub fn build_server_on(
    state: AppState,
    listener: TcpListener,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .listen(listener)?
    .run())
}
