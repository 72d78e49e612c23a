use crate::search::{ArchiveSearch, ArchiveStats, SearchError, SearchRequest, SearchResult};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

struct SharedState {
    engine: ArchiveSearch,
}

async fn start_app(engine: ArchiveSearch) {
    let shared_state = Arc::new(SharedState { engine });

    async fn shutdown_signal() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    let app = Router::new()
        .route("/api/search", post(search))
        .route("/api/stats", get(stats))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
    log::info!("listening on 0.0.0.0:8080");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

pub fn start_daemon(engine: ArchiveSearch) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vogue_archive=info,tower_http=info")),
        )
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async { start_app(engine).await });
}

// Wrapper so `?` works in handlers that fail with `SearchError`.
#[derive(Debug)]
struct HttpError(SearchError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        match self.0 {
            SearchError::Filter(_) => (
                axum::http::StatusCode::BAD_REQUEST,
                json!({"error": self.0.to_string()}).to_string(),
            ),
            SearchError::Embedding(_) => {
                log::error!("{self:?}");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": self.0.to_string()}).to_string(),
                )
            }
            SearchError::Index(_) => {
                log::error!("{self:?}");
                (
                    axum::http::StatusCode::BAD_GATEWAY,
                    json!({"error": self.0.to_string()}).to_string(),
                )
            }
        }
        .into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<SearchError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

async fn search(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, HttpError> {
    log::debug!("payload: {payload:?}");

    tokio::task::block_in_place(move || {
        let results = state.engine.search(&payload)?;
        Ok(Json(SearchResponse { results }))
    })
}

async fn stats(
    State(state): State<Arc<SharedState>>,
) -> Result<Json<ArchiveStats>, HttpError> {
    tokio::task::block_in_place(move || {
        let stats = state.engine.stats()?;
        Ok(Json(stats))
    })
}
