//! JSON HTTP API over the habit ledger.
//!
//! Routes:
//! - `GET    /api/habits?all=true` list (active only unless `all`)
//! - `POST   /api/habits`          create
//! - `GET    /api/habits/{id}`     fetch one
//! - `PATCH  /api/habits/{id}`     `{"action":"checkIn"}` or
//!                                   `{"action":"toggleActive","active":bool}`
//! - `DELETE /api/habits/{id}`     delete with all dependent records
//! - `GET    /api/stats`           summary over active habits
//!
//! Every failure, including a body or path the extractors reject, answers
//! with `{"error": message}`.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use clap::Args;
use habitroom_core::{stats, Config, CoreError, Habit, HabitId, HabitLedger, ValidationError};
use serde::Deserialize;
use serde_json::json;

#[derive(Args)]
pub struct ServeArgs {
    /// Bind address (default from config: server.host)
    #[arg(long)]
    host: Option<String>,
    /// Port (default from config: server.port)
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Clone)]
pub struct AppState {
    ledger: Arc<Mutex<HabitLedger>>,
}

impl AppState {
    pub fn new(ledger: HabitLedger) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Core(CoreError),
    BadRequest(String),
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Core(err) => {
                let status = match &err {
                    CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                    CoreError::InvalidState { .. } => StatusCode::CONFLICT,
                    CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %err, "request failed");
                }
                (status, err.to_string())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Run `f` against the ledger on the blocking pool.
async fn with_ledger<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&HabitLedger) -> Result<T, CoreError> + Send + 'static,
{
    let ledger = state.ledger.clone();
    tokio::task::spawn_blocking(move || {
        let guard = ledger
            .lock()
            .map_err(|_| ApiError::Internal("habit ledger lock poisoned".to_string()))?;
        f(&*guard).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    all: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateHabitBody {
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHabitBody {
    action: String,
    #[serde(default)]
    active: Option<bool>,
}

async fn list_habits(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    let Query(params) = params?;
    let habits = with_ledger(&state, move |ledger| ledger.list(!params.all)).await?;
    Ok(Json(habits))
}

async fn create_habit(
    State(state): State<AppState>,
    body: Result<Json<CreateHabitBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Habit>), ApiError> {
    let Json(body) = body?;
    let habit = with_ledger(&state, move |ledger| match body.description {
        Some(description) => {
            ledger.create_with_description(&body.name, &body.category, &description)
        }
        None => ledger.create(&body.name, &body.category),
    })
    .await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

async fn get_habit(
    State(state): State<AppState>,
    id: Result<Path<HabitId>, PathRejection>,
) -> Result<Json<Habit>, ApiError> {
    let Path(id) = id?;
    let habit = with_ledger(&state, move |ledger| ledger.get(id)).await?;
    Ok(Json(habit))
}

async fn update_habit(
    State(state): State<AppState>,
    id: Result<Path<HabitId>, PathRejection>,
    body: Result<Json<UpdateHabitBody>, JsonRejection>,
) -> Result<Json<Habit>, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let habit = match body.action.as_str() {
        "checkIn" => with_ledger(&state, move |ledger| ledger.check_in(id)).await?,
        "toggleActive" => {
            let active = body.active.ok_or_else(|| {
                ApiError::Core(
                    ValidationError::InvalidValue {
                        field: "active".to_string(),
                        message: "toggleActive requires a boolean 'active'".to_string(),
                    }
                    .into(),
                )
            })?;
            with_ledger(&state, move |ledger| ledger.toggle_active(id, active)).await?
        }
        other => return Err(ApiError::BadRequest(format!("Invalid action: {other}"))),
    };
    Ok(Json(habit))
}

async fn delete_habit(
    State(state): State<AppState>,
    id: Result<Path<HabitId>, PathRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Path(id) = id?;
    with_ledger(&state, move |ledger| ledger.delete(id)).await?;
    Ok(Json(json!({ "message": "Habit deleted successfully" })))
}

async fn summary(State(state): State<AppState>) -> Result<Json<stats::Summary>, ApiError> {
    let summary = with_ledger(&state, |ledger| {
        let habits = ledger.list(true)?;
        Ok(stats::summarize(&habits, ledger.today()))
    })
    .await?;
    Ok(Json(summary))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/habits", get(list_habits).post(create_habit))
        .route(
            "/api/habits/{id}",
            get(get_habit).patch(update_habit).delete(delete_habit),
        )
        .route("/api/stats", get(summary))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

pub fn run(args: ServeArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = HabitLedger::open(config)?;
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let app = router(AppState::new(ledger));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("listening on http://{addr}");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
