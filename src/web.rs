use crate::{
    config::Config,
    entries::{utc_now_iso, Entry, EntryPayload},
    errors::AppError,
    store::{Document, EntryStore, SearchResults},
    tag_tree::{TagTreeView, ALL_PATH},
};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::signal;
use tower_http::set_header::SetResponseHeaderLayer;

pub struct SharedState {
    pub store: EntryStore,
}

pub fn router(state: Arc<SharedState>, static_dir: Option<&str>) -> Router {
    let router = Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/entries",
            get(list_entries).post(create_entry).options(preflight),
        )
        .route(
            "/api/entries/:id",
            get(get_entry)
                .put(update_entry)
                .delete(delete_entry)
                .options(preflight),
        )
        .route("/api/export", get(export))
        .route("/api/import", post(import).options(preflight))
        .route("/api/tags/tree", get(tags_tree))
        .route("/api/search", get(search));

    let router = match static_dir {
        Some(dir) => router.fallback_service(tower_http::services::ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(state)
}

async fn start_app(config: Config, store: EntryStore) -> anyhow::Result<()> {
    let shared_state = Arc::new(SharedState { store });
    let app = router(shared_state, config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    log::info!("listening on {}", config.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::warn!("ctrl-c received, shutting down"),
        _ = terminate => log::warn!("terminate received, shutting down"),
    }
}

pub fn start_daemon(config: Config, store: EntryStore) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(start_app(config, store))
}

#[derive(Debug)]
struct HttpError(AppError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0 {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::Invalid(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::IO(_) | AppError::Json(_) | AppError::Other(_) => {
                log::error!("{self:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub time: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        time: utc_now_iso(),
    })
}

async fn list_entries(State(state): State<Arc<SharedState>>) -> Json<Vec<Entry>> {
    Json(state.store.list())
}

async fn create_entry(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<EntryPayload>,
) -> Result<(StatusCode, Json<Entry>), HttpError> {
    log::debug!("payload: {payload:?}");

    tokio::task::block_in_place(move || {
        let entry = state.store.create(payload)?;
        Ok((StatusCode::CREATED, Json(entry)))
    })
}

async fn get_entry(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<Entry>, HttpError> {
    Ok(Json(state.store.get(&id)?))
}

async fn update_entry(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
    Json(payload): Json<EntryPayload>,
) -> Result<Json<Entry>, HttpError> {
    log::debug!("update {id}: {payload:?}");

    tokio::task::block_in_place(move || Ok(Json(state.store.update(&id, payload)?)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub entry: Entry,
}

async fn delete_entry(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, HttpError> {
    tokio::task::block_in_place(move || {
        let entry = state.store.delete(&id)?;
        Ok(Json(DeleteResponse {
            deleted: true,
            entry,
        }))
    })
}

async fn export(State(state): State<Arc<SharedState>>) -> Json<Document> {
    Json(state.store.export())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub imported: usize,
}

async fn import(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<Value>,
) -> Result<Json<ImportResponse>, HttpError> {
    let items = match payload {
        Value::Object(mut obj) => match obj.remove("entries") {
            Some(Value::Array(items)) => items,
            _ => return Err(AppError::BadRequest("entries must be a list".into()).into()),
        },
        _ => return Err(AppError::BadRequest("entries must be a list".into()).into()),
    };

    tokio::task::block_in_place(move || {
        let imported = state.store.import(items)?;
        Ok(Json(ImportResponse { imported }))
    })
}

async fn tags_tree(State(state): State<Arc<SharedState>>) -> Json<TagTreeView> {
    Json(state.store.tag_tree().view())
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_search_path")]
    pub path: String,
}

fn default_search_path() -> String {
    ALL_PATH.to_string()
}

async fn search(
    State(state): State<Arc<SharedState>>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResults> {
    log::debug!("search: {params:?}");
    Json(state.store.search(&params.q, &params.path))
}
