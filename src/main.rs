use std::net::{IpAddr, SocketAddr};

use cryptopulse::{AppState, config, routes};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = config::load();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    let state = AppState::new(settings.clone())?;

    // Pages show a loading state until listing + stats are in; the feed
    // starts over whatever listing came back.
    let loader = state.clone();
    let feed_task = tokio::spawn(async move {
        loader.load_market().await;
        loader.start_feed()
    });

    let app = routes::app(state);

    let addr = SocketAddr::from((settings.host.parse::<IpAddr>()?, settings.port));
    tracing::info!(
        "listening on http://{} (prices: {:?})",
        addr,
        settings.price_source
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if feed_task.is_finished() {
        if let Ok(feed) = feed_task.await {
            feed.stop().await;
        }
    } else {
        feed_task.abort();
    }

    tracing::info!("bye");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
