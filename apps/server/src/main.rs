use std::net::SocketAddr;

use pricecache_server::api::app_router;
use pricecache_server::config::Config;
use pricecache_server::scheduler::start_rate_limit_sweeper;
use pricecache_server::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level);
    let state = build_state(&config).await?;

    start_rate_limit_sweeper(state.clone());

    let router = app_router(state);
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
