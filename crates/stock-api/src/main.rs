//! 주식 대시보드 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 설정 로드 → 로깅 → Redis 연결 → 업스트림 클라이언트 → 게이트웨이 순으로
//! 구성한 뒤 라우터를 띄웁니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use stock_api::metrics::setup_metrics_recorder;
use stock_api::middleware::metrics_layer;
use stock_api::routes::create_api_router;
use stock_api::state::AppState;
use stock_core::{init_logging, AppConfig, CorsConfig, LogConfig};
use stock_data::{AlphaVantageClient, RateLimitConfig, RateLimiter, RedisCache, StockDataGateway};

/// CORS 미들웨어 구성.
///
/// 허용 origin 목록이 비어 있으면 모든 origin을 허용하고(자격 증명 불가),
/// 목록이 있으면 해당 origin만 허용하고 자격 증명을 허용합니다.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("apikey"),
        ])
        // preflight 요청 캐시 시간
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        warn!("No valid CORS origins configured, allowing any origin");
        layer.allow_origin(AllowOrigin::any())
    } else {
        info!("CORS configured with {} allowed origins", origins.len());
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle, config: &AppConfig) -> Router {
    // 메트릭 라우터 (별도 상태, API 키 검증 제외)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router(state))
        // 메트릭 미들웨어 (모든 요청에 적용)
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.server.request_timeout(),
        ))
        .layer(cors_layer(&config.cors))
}

/// 설정으로부터 게이트웨이와 AppState를 구성합니다.
async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache = Arc::new(
        RedisCache::connect(&config.redis)
            .await
            .context("Redis 연결 실패. STOCKDASH__REDIS__URL을 확인하세요.")?,
    );
    info!("Connected to Redis");

    let provider = Arc::new(AlphaVantageClient::from_config(&config.upstream)?);
    info!(base_url = provider.base_url(), "Upstream client configured");

    let rate_limiter = RateLimiter::new(cache.clone(), RateLimitConfig::from(&config.rate_limit));
    info!(
        per_minute = config.rate_limit.per_minute,
        per_day = config.rate_limit.per_day,
        "Upstream rate limiting configured"
    );

    let gateway = StockDataGateway::new(cache, provider, rate_limiter, config.cache.ttl_secs);

    let client_api_key = config.auth.client_api_key();
    if client_api_key.is_none() {
        warn!("auth.client_api_key not set, API key check is DISABLED");
    }

    Ok(AppState::new(Arc::new(gateway)).with_client_api_key(client_api_key))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load().context("설정 로드 실패")?;

    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!("Starting Stock Dashboard API server...");

    // Prometheus 메트릭 레코더 설정
    let metrics_handle = setup_metrics_recorder()
        .map_err(|e| anyhow::anyhow!("Prometheus 레코더 설치 실패: {}", e))?;
    info!("Prometheus metrics recorder initialized");

    let state = Arc::new(create_app_state(&config).await.map_err(|e| {
        error!(error = %e, "Failed to initialize application state");
        e
    })?);
    info!(version = %state.version, cache_ttl_secs = config.cache.ttl_secs, "Application state initialized");

    let app = create_router(state, metrics_handle, &config);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("{} 바인딩 실패", addr))?;

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
