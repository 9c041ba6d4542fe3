//! Flow Region Editor configuration server
//!
//! Serves the single persisted editor configuration over HTTP.
//!
//! ## Endpoints
//!
//! ```text
//! GET  /api/load-config   -> { "exists": false } | { "exists": true, "config": {...} }
//! GET  /api/save-config   -> same as /api/load-config
//! POST /api/save-config   <- { "regions": {...}, "lines": {...}, "doors": {...} }
//!                         -> { "success": true }
//! ```
//!
//! Failures answer with `{ "error": "..." }` and a 4xx/5xx status.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use flowedit_core::storage::DEFAULT_CONFIG_FILE;
use flowedit_core::{ConfigDocument, ConfigStore, FileStore, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Command line configuration.
#[derive(Parser, Debug)]
#[command(name = "flowedit-server", version, about = "Load/save server for flow region editor configurations")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "FLOWEDIT_ADDR", default_value = "0.0.0.0:3030")]
    addr: SocketAddr,

    /// Path of the persisted YAML configuration.
    #[arg(long, env = "FLOWEDIT_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

/// Response to a load request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadResponse {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigDocument>,
}

/// Response to a successful save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug)]
enum ApiError {
    /// The request body was not a configuration document.
    BadRequest(String),
    /// The store could not be read or written.
    Storage(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Storage(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<dyn ConfigStore>,
}

impl AppState {
    fn new(store: impl ConfigStore + 'static) -> Self {
        Self { store: Arc::new(store) }
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/load-config", get(load_config))
        .route("/api/save-config", get(load_config).post(save_config))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowedit_server=info,flowedit_core=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    info!("Using configuration file {}", args.config.display());
    let state = AppState::new(FileStore::new(args.config));

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!("Flow editor server listening on {}", args.addr);
    axum::serve(listener, app(state)).await
}

/// Index page
async fn index() -> &'static str {
    "Flow Region Editor server - GET /api/load-config, POST /api/save-config"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// Run a store operation on the blocking pool, off the async workers.
async fn run_store<T, F>(store: Arc<dyn ConfigStore>, op: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn ConfigStore) -> StoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .unwrap_or_else(|e| Err(StoreError::Io(format!("Store task failed: {}", e))))
}

/// Return the persisted configuration, or `exists: false` if none was saved.
async fn load_config(State(state): State<AppState>) -> Result<Json<LoadResponse>, ApiError> {
    let handle = tokio::runtime::Handle::current();
    let loaded = run_store(state.store.clone(), move |store| handle.block_on(store.load())).await;
    match loaded {
        Ok(config) => Ok(Json(LoadResponse {
            exists: true,
            config: Some(config),
        })),
        Err(StoreError::NotFound) => Ok(Json(LoadResponse {
            exists: false,
            config: None,
        })),
        Err(e) => {
            warn!("Error loading config: {}", e);
            Err(ApiError::Storage("Failed to load configuration"))
        }
    }
}

/// Replace the persisted configuration with the request body.
async fn save_config(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<SaveResponse>, ApiError> {
    let document = ConfigDocument::from_json(&body).map_err(|e| {
        warn!("Rejected save request: {}", e);
        ApiError::BadRequest(e.to_string())
    })?;
    let (regions, lines, doors) = (document.regions.len(), document.lines.len(), document.doors.len());

    let handle = tokio::runtime::Handle::current();
    run_store(state.store.clone(), move |store| handle.block_on(store.save(&document)))
        .await
        .map_err(|e| {
            warn!("Error saving config: {}", e);
            ApiError::Storage("Failed to save configuration")
        })?;

    info!("Saved configuration: {} regions, {} lines, {} doors", regions, lines, doors);
    Ok(Json(SaveResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use flowedit_core::MemoryStore;
    use flowedit_core::storage::BoxFuture;
    use tower::ServiceExt;

    struct BrokenStore;

    impl ConfigStore for BrokenStore {
        fn save(&self, _: &ConfigDocument) -> BoxFuture<'_, StoreResult<()>> {
            Box::pin(async { Err(StoreError::Io("disk unavailable".to_string())) })
        }

        fn load(&self) -> BoxFuture<'_, StoreResult<ConfigDocument>> {
            Box::pin(async { Err(StoreError::Io("disk unavailable".to_string())) })
        }

        fn exists(&self) -> BoxFuture<'_, StoreResult<bool>> {
            Box::pin(async { Ok(false) })
        }
    }

    const TRIANGLE: &str = r#"{
        "regions": { "region_1": { "points": [[0, 0], [100, 0], [50, 100]] } },
        "lines": { "line_1": { "start": [1.5, 2], "end": [3, 4] } },
        "doors": { "door_1": { "pathPoints": [[50, 0], [100, 0], [75, 50]] } }
    }"#;

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/save-config")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_load_before_save_reports_missing() {
        let app = app(AppState::new(MemoryStore::new()));
        let response = app.oneshot(get_request("/api/load-config")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({ "exists": false }));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let app = app(AppState::new(MemoryStore::new()));

        let response = app.clone().oneshot(post_request(TRIANGLE)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({ "success": true }));

        let response = app.oneshot(get_request("/api/save-config")).await.unwrap();
        let body: LoadResponse = serde_json::from_value(json_body(response).await).unwrap();
        assert!(body.exists);
        let config = body.config.unwrap();
        assert_eq!(config.regions["region_1"].points.len(), 3);
        assert_eq!(config.lines["line_1"].start.0, 1.5);
        assert_eq!(config.doors["door_1"].path_points.len(), 3);
    }

    #[tokio::test]
    async fn test_save_writes_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let app = app(AppState::new(FileStore::new(path.clone())));

        let response = app.oneshot(post_request(TRIANGLE)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let yaml = std::fs::read_to_string(path).unwrap();
        assert!(yaml.contains("(50, 100)"));
        assert!(yaml.contains("pathPoints"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = app(AppState::new(MemoryStore::new()));
        let body = r#"{ "regions": { "region_1": { "points": [["x", 0]] } }, "lines": {}, "doors": {} }"#;

        let response = app.oneshot(post_request(body)).await.unwrap();
        assert!(response.status().is_client_error());
        assert!(json_body(response).await.get("error").is_some());
    }

    #[tokio::test]
    async fn test_missing_category_is_bad_request() {
        let app = app(AppState::new(MemoryStore::new()));
        let response = app.oneshot(post_request(r#"{ "regions": {}, "lines": {} }"#)).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_unreadable_file_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "regions: [not, a, mapping]\n").unwrap();
        let app = app(AppState::new(FileStore::new(path)));

        let response = app.oneshot(get_request("/api/load-config")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({ "error": "Failed to load configuration" })
        );
    }

    #[tokio::test]
    async fn test_storage_failure_on_save() {
        let app = app(AppState::new(BrokenStore));
        let response = app.oneshot(post_request(TRIANGLE)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let app = app(AppState::new(FileStore::new(path.clone())));

        let requests: Vec<_> = (0..16)
            .map(|_| tokio::spawn(app.clone().oneshot(post_request(TRIANGLE))))
            .collect();
        for request in requests {
            let response = request.await.unwrap().unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.oneshot(get_request("/api/load-config")).await.unwrap();
        let body: LoadResponse = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(body.config.unwrap().regions["region_1"].points.len(), 3);
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(AppState::new(MemoryStore::new()));
        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
