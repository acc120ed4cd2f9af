use anyhow::Context;
use axum::http::{self, HeaderValue, Method};
use dotenvy::dotenv;
use env_logger::Builder;
use log::LevelFilter;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use party_server::{app, state::AppState, utils::config::CONFIG};

fn init_logger() {
    let mut builder = Builder::from_env(env_logger::Env::default().default_filter_or("debug"));
    builder
        .filter_module("tower_http", LevelFilter::Debug)
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .format_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenv() {
        eprintln!("Warning: could not load .env: {}", e);
    }

    init_logger();

    let state = AppState::new();
    log::info!(
        "auto advance: {}, driver tick: {} ms",
        state.game_config.auto_advance_phases,
        state.game_config.driver_tick_ms
    );

    let origin = CONFIG
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid CORS_ORIGIN {}", CONFIG.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin([origin])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([http::header::CONTENT_TYPE]);

    let app = app::create_app_with_state(state).layer(cors).layer(
        TraceLayer::new_for_http().make_span_with(|request: &http::Request<_>| {
            tracing::info_span!(
                "HTTP request",
                method = %request.method(),
                uri = %request.uri(),
            )
        }),
    );

    let listener = tokio::net::TcpListener::bind(&CONFIG.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", CONFIG.bind_addr))?;

    log::info!("listening on http://{}", CONFIG.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
