/*
 * Responsibility
 * - .env 読み込み → tracing 初期化 → Config 読み込み → Router 組み立て
 * - Middleware の適用 (http layers / HSTS)
 * - axum::serve() で起動
 */
use std::{panic, process};

use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::AppError;
use crate::middleware::{self, hsts::HstsConfig, http::HttpLimits};
use crate::{api, state::AppState};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,hsts_filter=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    // Before init_tracing so RUST_LOG from .env is honored.
    dotenvy::dotenv().ok();
    init_tracing();
    let config = Config::from_env();
    init_panic_hook(!config.app_env.is_production());

    // Read once; immutable for the rest of the process.
    let hsts = HstsConfig::from_params(&config.hsts_params);
    if hsts.enabled {
        tracing::info!(
            overwrite = hsts.overwrite,
            value = %hsts.header_value(),
            "HSTS enabled"
        );
    } else {
        tracing::info!("HSTS disabled");
    }

    tracing::info!(
        "starting server in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let app = build_router(AppState::new(), config.http_limits, hsts);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: config.addr,
            source,
        })?;
    axum::serve(listener, app).await.map_err(AppError::Serve)?;

    Ok(())
}

fn build_router(state: AppState, limits: HttpLimits, hsts: HstsConfig) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    with_middleware(router, limits, hsts)
}

fn with_middleware(router: Router, limits: HttpLimits, hsts: HstsConfig) -> Router {
    let router = middleware::http::apply(router, limits);
    // Outermost, so 404s, 408s and 413s pass through it too.
    middleware::hsts::apply(router, hsts)
}
