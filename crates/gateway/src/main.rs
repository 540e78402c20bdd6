//! CiteMap API Gateway
//!
//! HTTP front end for the network engine.
//! Handles:
//! - Network build, filter, merge, layout and expansion
//! - Paper search through the configured paper source
//! - Rate limiting
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use citemap_common::{
    config::AppConfig,
    metrics,
    retrieval::{PaperSource, RequestScheduler, SchedulerConfig, ScholarClient},
};
use citemap_network::{NetworkOptions, SimilarityEngine};
use metrics_exporter_prometheus::PrometheusBuilder;
use middleware::rate_limit::{rate_limit_middleware, RateLimit};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: SimilarityEngine,
    pub network_options: NetworkOptions,
    pub source: Arc<dyn PaperSource>,
}

impl AppState {
    /// State backed by the given paper source
    pub fn new(config: Arc<AppConfig>, source: Arc<dyn PaperSource>) -> anyhow::Result<Self> {
        let engine = SimilarityEngine::from_config(&config.similarity).context("invalid similarity weights")?;
        let network_options = NetworkOptions::from(&config.network);
        network_options.validate().context("invalid network options")?;

        Ok(Self {
            config,
            engine,
            network_options,
            source,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load().context("failed to load configuration")?);

    init_tracing(&config);
    info!(
        service = %config.observability.service_name,
        "Starting CiteMap API Gateway v{}",
        citemap_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port > 0 {
        PrometheusBuilder::new()
            .with_http_listener(SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port)))
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()
            .context("failed to install Prometheus exporter")?;
        info!(port = config.observability.metrics_port, "Prometheus exporter listening");
    }
    metrics::register_metrics();

    // Paper source
    let scheduler = Arc::new(RequestScheduler::new(SchedulerConfig::from(&config.retrieval)));
    let source: Arc<dyn PaperSource> = Arc::new(ScholarClient::new(&config.retrieval, scheduler)?);

    let state = AppState::new(config.clone(), source)?;
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// JSON or plain tracing output, filtered by `RUST_LOG` or the configured level
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_timeout = state.config.request_timeout();
    let rate_limit = RateLimit::new(
        state.config.rate_limit.requests_per_second,
        state.config.rate_limit.burst,
    );

    // API routes
    let mut api_routes = Router::new()
        .route("/networks", post(handlers::networks::build_network))
        .route("/networks/filter", post(handlers::networks::filter_network))
        .route("/networks/year-range", post(handlers::networks::filter_by_year_range))
        .route("/networks/merge", post(handlers::networks::merge_networks))
        .route("/networks/influential", post(handlers::networks::influential_papers))
        .route("/networks/layout", post(handlers::networks::layout_network))
        .route("/networks/expand", post(handlers::networks::expand))
        .route("/papers/search", get(handlers::papers::search_papers))
        .route("/papers/{id}", get(handlers::papers::get_paper));

    if state.config.rate_limit.enabled {
        api_routes = api_routes.layer(axum::middleware::from_fn_with_state(rate_limit, rate_limit_middleware));
    }

    // Health is exempt from rate limiting
    let api_routes = api_routes.route("/health", get(handlers::health::health));

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .layer(axum::middleware::from_fn(middleware::track_requests))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(cors),
        )
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use citemap_common::models::Paper;
    use citemap_common::retrieval::StaticPaperSource;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn paper(id: &str, year: i32, citations: u32) -> Paper {
        Paper {
            year,
            citation_count: citations,
            ..Paper::new(id, format!("Paper {}", id))
        }
    }

    fn app_with(config: AppConfig) -> Router {
        let source = StaticPaperSource::new(vec![
            paper("a", 2020, 500),
            paper("b", 2015, 800),
            paper("c", 2010, 40),
            paper("d", 2019, 120),
        ])
        .with_reference("d", "a")
        .with_reference("a", "b");
        let state = AppState::new(Arc::new(config), Arc::new(source)).unwrap();
        create_router(state)
    }

    fn app() -> Router {
        app_with(AppConfig::default())
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn sample_papers() -> Value {
        json!([
            {"id": "a", "year": 2020, "citationCount": 500},
            {"id": "b", "year": 2015, "citationCount": 800},
            {"id": "c", "year": 2010, "citationCount": 40}
        ])
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(app(), "GET", "/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["paperSource"], "static");
    }

    #[tokio::test]
    async fn test_build_network() {
        let body = json!({"papers": sample_papers(), "originPaperId": "a", "layout": "hierarchical"});
        let (status, body) = call(app(), "POST", "/v1/networks", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["graph"]["originPaperId"], "a");
        assert_eq!(body["stats"]["includedPapers"], 3);
        assert_eq!(body["graph"]["edges"][0]["id"], "cites:a:b");
        assert!(body["similarities"]["b"]["overall"].is_number());
    }

    #[tokio::test]
    async fn test_build_rejects_empty_and_filtered_out() {
        let (status, body) = call(
            app(),
            "POST",
            "/v1/networks",
            Some(json!({"papers": [], "originPaperId": "a"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = call(
            app(),
            "POST",
            "/v1/networks",
            Some(json!({"papers": sample_papers(), "originPaperId": "a", "options": {"minCitations": 100000}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "EMPTY_NETWORK");
    }

    #[tokio::test]
    async fn test_paper_limit_enforced() {
        let mut config = AppConfig::default();
        config.server.max_papers_per_request = 2;
        let body = json!({"papers": sample_papers(), "originPaperId": "a"});

        let (status, _) = call(app_with(config), "POST", "/v1/networks", Some(body)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_build_then_year_range() {
        let build_body = json!({"papers": sample_papers(), "originPaperId": "a"});
        let (_, built) = call(app(), "POST", "/v1/networks", Some(build_body)).await;

        let body = json!({"graph": built["graph"], "yearRange": [2016, 2025]});
        let (status, graph) = call(app(), "POST", "/v1/networks/year-range", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(graph["nodes"].as_array().unwrap().len(), 1);
        assert_eq!(graph["edges"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_inverted_year_range_rejected() {
        let build_body = json!({"papers": sample_papers(), "originPaperId": "a"});
        let (_, built) = call(app(), "POST", "/v1/networks", Some(build_body)).await;

        let body = json!({"graph": built["graph"], "yearRange": [2025, 2016]});
        let (status, _) = call(app(), "POST", "/v1/networks/year-range", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_expand_uses_paper_source() {
        let build_body = json!({"papers": sample_papers(), "originPaperId": "a"});
        let (_, built) = call(app(), "POST", "/v1/networks", Some(build_body)).await;

        let body = json!({"graph": built["graph"], "paperId": "a"});
        let (status, expanded) = call(app(), "POST", "/v1/networks/expand", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(expanded["graph"]["originPaperId"], "a");
        assert_eq!(expanded["addedNodes"], 1);
        assert!(expanded["papers"]["d"].is_object());
    }

    #[tokio::test]
    async fn test_expand_unknown_paper() {
        let build_body = json!({"papers": sample_papers(), "originPaperId": "a"});
        let (_, built) = call(app(), "POST", "/v1/networks", Some(build_body)).await;

        let body = json!({"graph": built["graph"], "paperId": "zzz"});
        let (status, body) = call(app(), "POST", "/v1/networks/expand", Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "PAPER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_search_papers() {
        let (status, body) = call(app(), "GET", "/v1/papers/search?query=paper&limit=2", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalResults"], 2);
        assert_eq!(body["papers"][0]["id"], "b");

        let (status, _) = call(app(), "GET", "/v1/papers/search?query=", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_paper() {
        let (status, body) = call(app(), "GET", "/v1/papers/d", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["year"], 2019);

        let (status, _) = call(app(), "GET", "/v1/papers/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_excess() {
        let mut config = AppConfig::default();
        config.rate_limit.requests_per_second = 1;
        config.rate_limit.burst = 1;
        let app = app_with(config);

        let (first, _) = call(app.clone(), "GET", "/v1/papers/d", None).await;
        let (second, body) = call(app.clone(), "GET", "/v1/papers/d", None).await;
        let (health, _) = call(app, "GET", "/v1/health", None).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "RATE_LIMITED");
        assert_eq!(health, StatusCode::OK);
    }
}
