use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use hrtrack::auth::jwt::JwtService;
use hrtrack::clock::SystemClock;
use hrtrack::config::AppConfig;
use hrtrack::db;
use hrtrack::geo::{DisabledGeocoder, NominatimGeocoder, ReverseGeocoder};
use hrtrack::routes;
use hrtrack::state::AppState;
use hrtrack::tracking::{engine, OfficeHours, Tracker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "server",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        server_host = %config.server_host,
        server_port = config.server_port,
        office_timezone = %config.office_timezone,
        geocoder_enabled = config.geocoder_endpoint.is_some(),
        "loaded backend configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    let jwt = JwtService::from_config(&config)?;
    let geocoder: Arc<dyn ReverseGeocoder> = match &config.geocoder_endpoint {
        Some(endpoint) => Arc::new(NominatimGeocoder::new(endpoint.clone())?),
        None => Arc::new(DisabledGeocoder),
    };
    let tracker = Arc::new(Tracker::new(OfficeHours::from_config(&config)));

    let state = AppState::new(
        pool,
        config,
        jwt,
        Arc::new(SystemClock),
        geocoder,
        tracker,
    );

    let engine_state = state.clone();
    tokio::spawn(async move {
        engine::run(engine_state).await;
    });

    let listen_addr: SocketAddr = {
        let config = state.config.clone();
        format!("{}:{}", config.server_host, config.server_port).parse()?
    };
    let router = routes::create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            tracing::info!("server received shutdown signal");
        })
        .await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
