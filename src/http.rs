use crate::errors::{AppError, AppResult};
use crate::models::{
    AssignmentsQuery, Assignment, CreatePersonPayload, CreateStandardLocationPayload, IdQuery,
    Person, StandardLocation, UpdatePersonPayload, UpdateStandardLocationPayload,
    UpsertAssignmentPayload, UpsertOutcome, WeekQuery, WeekView,
};
use crate::schedule;
use crate::store::Store;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/api/persons",
            get(list_persons)
                .post(create_person)
                .put(update_person)
                .delete(delete_person),
        )
        .route("/api/locations", get(list_assignments).post(upsert_assignments))
        .route(
            "/api/standard-locations",
            get(list_standard_locations)
                .post(create_standard_location)
                .put(update_standard_location)
                .delete(delete_standard_location),
        )
        .route("/api/week", get(week_view))
        .layer(middleware::from_fn(request_span))
        .with_state(state)
}

async fn request_span(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "request",
        %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    next.run(request).instrument(span).await
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Io(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn required_trimmed(value: Option<&str>, message: &str) -> AppResult<String> {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed.to_string()),
        _ => Err(AppError::Validation(message.to_string())),
    }
}

fn required_id(value: Option<i64>, message: &str) -> AppResult<i64> {
    value.ok_or_else(|| AppError::Validation(message.to_string()))
}

fn parse_id_param(raw: Option<&str>) -> AppResult<i64> {
    raw.ok_or_else(|| AppError::Validation("ID is required".to_string()))?
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation("ID is required".to_string()))
}

async fn healthz() -> &'static str {
    "ok"
}

// ─── Persons ─────────────────────────────────────────────────────────────

async fn list_persons(State(state): State<AppState>) -> AppResult<Json<Vec<Person>>> {
    Ok(Json(state.store.list_persons()?))
}

async fn create_person(
    State(state): State<AppState>,
    Json(payload): Json<CreatePersonPayload>,
) -> AppResult<Json<Person>> {
    let name = required_trimmed(payload.name.as_deref(), "Name and email are required")?;
    let email = required_trimmed(payload.email.as_deref(), "Name and email are required")?;
    Ok(Json(state.store.create_person(&name, &email)?))
}

async fn update_person(
    State(state): State<AppState>,
    Json(payload): Json<UpdatePersonPayload>,
) -> AppResult<Json<Person>> {
    let id = required_id(payload.id, "ID, name and email are required")?;
    let name = required_trimmed(payload.name.as_deref(), "ID, name and email are required")?;
    let email = required_trimmed(payload.email.as_deref(), "ID, name and email are required")?;
    match state.store.update_person(id, &name, &email)? {
        Some(person) => Ok(Json(person)),
        None => Err(AppError::NotFound("Person not found".to_string())),
    }
}

async fn delete_person(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> AppResult<Json<Person>> {
    let id = parse_id_param(query.id.as_deref())?;
    match state.store.delete_person(id)? {
        Some(person) => Ok(Json(person)),
        None => Err(AppError::NotFound("Person not found".to_string())),
    }
}

// ─── Assignments ─────────────────────────────────────────────────────────

async fn list_assignments(
    State(state): State<AppState>,
    Query(query): Query<AssignmentsQuery>,
) -> AppResult<Json<Vec<Assignment>>> {
    let assignments = match (query.start_date.as_deref(), query.end_date.as_deref()) {
        (Some(start), Some(end)) => {
            let start = schedule::parse_date(start)?;
            let end = schedule::parse_date(end)?;
            state.store.assignments_in_range(start, end)?
        }
        _ => state.store.list_assignments()?,
    };
    Ok(Json(assignments))
}

async fn upsert_assignments(
    State(state): State<AppState>,
    Json(payload): Json<UpsertAssignmentPayload>,
) -> AppResult<Json<UpsertOutcome>> {
    let person_id = required_id(payload.person_id, "personId and location are required")?;
    let location = required_trimmed(payload.location.as_deref(), "personId and location are required")?;

    if let Some(raw) = payload.date.as_deref() {
        let date = schedule::parse_date(raw)?;
        let assignment = state.store.upsert_assignment(person_id, date, &location)?;
        return Ok(Json(UpsertOutcome::Single(assignment)));
    }

    match (payload.start_date.as_deref(), payload.end_date.as_deref()) {
        (Some(start), Some(end)) => {
            let start = schedule::parse_date(start)?;
            let end = schedule::parse_date(end)?;
            if start > end {
                return Err(AppError::Validation(
                    "startDate must not be after endDate".to_string(),
                ));
            }
            let assignments = state
                .store
                .upsert_assignment_range(person_id, start, end, &location)?;
            Ok(Json(UpsertOutcome::Range(assignments)))
        }
        _ => Err(AppError::Validation(
            "Either date or startDate and endDate are required".to_string(),
        )),
    }
}

// ─── Standard locations ──────────────────────────────────────────────────

async fn list_standard_locations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<StandardLocation>>> {
    Ok(Json(state.store.list_standard_locations()?))
}

async fn create_standard_location(
    State(state): State<AppState>,
    Json(payload): Json<CreateStandardLocationPayload>,
) -> AppResult<Json<StandardLocation>> {
    let name = required_trimmed(payload.name.as_deref(), "Location name is required")?;
    Ok(Json(state.store.create_standard_location(&name)?))
}

async fn update_standard_location(
    State(state): State<AppState>,
    Json(payload): Json<UpdateStandardLocationPayload>,
) -> AppResult<Json<StandardLocation>> {
    let id = required_id(payload.id, "ID and name are required")?;
    let name = required_trimmed(payload.name.as_deref(), "ID and name are required")?;
    match state.store.update_standard_location(id, &name)? {
        Some(location) => Ok(Json(location)),
        None => Err(AppError::NotFound("Location not found".to_string())),
    }
}

async fn delete_standard_location(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> AppResult<Json<StandardLocation>> {
    let id = parse_id_param(query.id.as_deref())?;
    match state.store.delete_standard_location(id)? {
        Some(location) => Ok(Json(location)),
        None => Err(AppError::NotFound("Location not found".to_string())),
    }
}

// ─── Week view ───────────────────────────────────────────────────────────

async fn week_view(
    State(state): State<AppState>,
    Query(query): Query<WeekQuery>,
) -> AppResult<Json<WeekView>> {
    let offset = match query.offset.as_deref() {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::Validation(format!("Invalid week offset: {raw}")))?,
        None => 0,
    };
    let today = chrono::Utc::now().date_naive();
    let start = schedule::week_start(today, offset)?;
    let dates = schedule::week_dates(start);
    let end = dates.last().copied().unwrap_or(start);

    let persons = state.store.list_persons()?;
    let assignments = state.store.assignments_in_range(start, end)?;
    Ok(Json(schedule::build_week_view(start, &persons, &assignments)))
}
