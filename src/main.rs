use candidate_dashboard::services::{
    candidate_service::{CandidateService, CandidateStore},
    change_feed_service::PgChangeFeed,
    realtime_service::RealtimeListener,
    rest_candidate_service::RestCandidateService,
};
use candidate_dashboard::{
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    router, AppState,
};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("candidate_dashboard=info,tower_http=info")),
        )
        .init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    if config.runs_migrations() {
        run_migrations(&pool).await?;
    } else {
        info!("Hosted table mode, leaving the schema to its owner");
    }

    let feed = PgChangeFeed::new(pool.clone(), config.change_channel.clone());
    feed.ensure_notifier().await?;

    let store: Arc<dyn CandidateStore> = match &config.rest {
        Some(rest) => {
            info!("Reading candidates from hosted table at {}", rest.url);
            let http_client = Client::builder()
                .timeout(Duration::from_secs(30))
                .build()?;
            Arc::new(RestCandidateService::new(rest, http_client))
        }
        None => Arc::new(CandidateService::new(pool.clone())),
    };

    let app_state = AppState::new(store);
    let dashboard = app_state.dashboard.clone();
    let listener =
        RealtimeListener::mount(dashboard.clone(), &feed, config.refresh_debounce()).await?;

    let app = router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let tcp = TcpListener::bind(addr).await?;
    axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    listener.stop().await;
    dashboard.unmount();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
