use dotenvy::dotenv;
use order_analytics::{build_server, create_pool, run_migrations, AppState, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(std::io::Error::other)?;

    let pool =
        create_pool(&config.database_url, config.store_timeout).map_err(std::io::Error::other)?;
    run_migrations(&pool).map_err(std::io::Error::other)?;

    log::info!(
        "Starting server at http://{}:{} (stats cache {:?})",
        config.host,
        config.port,
        config.stats_ttl
    );

    let state = AppState::with_database(pool, &config);
    build_server(state, &config.host, config.port)?.await
}
