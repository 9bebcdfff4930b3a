//! Axum request handlers for all service endpoints.
//!
//! Handlers only ever see plaintext records from the repository; no stored
//! document is serialised into a response.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{
    protocol::{
        CountResponse, ErrorResponse, HealthResponse, MessageResponse, MigrationRequest,
        MigrationResponse, NewSale, NewSalesPerson, SaleUpdate,
    },
    ServiceError,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    middleware::{ApiJson, ApiPath, Caller},
    state::AppState,
};
use crate::mapping::EntityKind;
use crate::store::RepositoryError;

/// Render a [`ServiceError`] as a JSON error response with its mapped status.
pub fn error_response(err: &ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::new(err.code(), err.to_string()))).into_response()
}

fn repository_failure(err: RepositoryError, operation: &'static str) -> Response {
    if !matches!(
        err,
        RepositoryError::NotFound(_) | RepositoryError::DuplicateName(_)
    ) {
        warn!(operation, error = %err, "repository operation failed");
    }
    error_response(&err.into())
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

/// `POST /sales`: store a new deal for the caller.
pub async fn create_sale(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiJson(req): ApiJson<NewSale>,
) -> Response {
    match state.repo.create_sale(&owner, req).await {
        Ok(sale) => (StatusCode::CREATED, Json(sale)).into_response(),
        Err(e) => repository_failure(e, "create_sale"),
    }
}

/// `GET /sales`: the caller's deals, newest first.
pub async fn list_sales(State(state): State<AppState>, Caller(owner): Caller) -> Response {
    match state.repo.list_sales(&owner).await {
        Ok(sales) => (StatusCode::OK, Json(sales)).into_response(),
        Err(e) => repository_failure(e, "list_sales"),
    }
}

/// `GET /sales/count`
pub async fn count_sales(State(state): State<AppState>, Caller(owner): Caller) -> Response {
    let count = state.repo.count_sales(&owner).await;
    (StatusCode::OK, Json(CountResponse { count })).into_response()
}

/// `GET /sales/:id`
pub async fn get_sale(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> Response {
    match state.repo.get_sale(&owner, id).await {
        Ok(sale) => (StatusCode::OK, Json(sale)).into_response(),
        Err(e) => repository_failure(e, "get_sale"),
    }
}

/// `PUT /sales/:id`: partial update; absent fields are left as stored.
pub async fn update_sale(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<SaleUpdate>,
) -> Response {
    match state.repo.update_sale(&owner, id, update).await {
        Ok(sale) => (StatusCode::OK, Json(sale)).into_response(),
        Err(e) => repository_failure(e, "update_sale"),
    }
}

/// `DELETE /sales/:id`
pub async fn delete_sale(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> Response {
    match state.repo.delete_sale(&owner, id).await {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::new("Sale deleted successfully")))
            .into_response(),
        Err(e) => repository_failure(e, "delete_sale"),
    }
}

/// `POST /sales/migration`: attach the caller's unassigned deals to an organisation.
pub async fn migrate_sales(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiJson(req): ApiJson<MigrationRequest>,
) -> Response {
    let organization_id = req.organization_id.trim();
    if organization_id.is_empty() {
        return error_response(&ServiceError::BadRequest(
            "organizationId must not be empty".into(),
        ));
    }

    let migrated_count = state
        .repo
        .assign_organization(&owner, organization_id)
        .await;
    info!(migrated_count, "organization migration complete");

    let body = MigrationResponse {
        migrated_count,
        message: format!(
            "Successfully migrated {migrated_count} sales to organization {organization_id}"
        ),
    };
    (StatusCode::OK, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Salespeople
// ---------------------------------------------------------------------------

/// `POST /sales-persons`
pub async fn create_sales_person(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiJson(req): ApiJson<NewSalesPerson>,
) -> Response {
    if req.name.trim().is_empty() {
        return error_response(&ServiceError::BadRequest("name must not be empty".into()));
    }
    match state.repo.create_sales_person(&owner, req).await {
        Ok(person) => (StatusCode::CREATED, Json(person)).into_response(),
        Err(e) => repository_failure(e, "create_sales_person"),
    }
}

/// `GET /sales-persons`
pub async fn list_sales_persons(State(state): State<AppState>, Caller(owner): Caller) -> Response {
    match state.repo.list_sales_persons(&owner).await {
        Ok(people) => (StatusCode::OK, Json(people)).into_response(),
        Err(e) => repository_failure(e, "list_sales_persons"),
    }
}

/// `DELETE /sales-persons/:id`
pub async fn delete_sales_person(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> Response {
    match state.repo.delete_sales_person(&owner, id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Sales person deleted successfully")),
        )
            .into_response(),
        Err(e) => repository_failure(e, "delete_sales_person"),
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// `GET /health`: liveness and readiness check.
///
/// Returns `200 OK` when the field codec passes its self-test.
/// Returns `503 Service Unavailable` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let encryption_ready = state.repo.codec().self_test().is_ok();
    let store = state.repo.store();
    let sales_stored = store.len(EntityKind::Sale.collection()).await;
    let sales_persons_stored = store.len(EntityKind::SalesPerson.collection()).await;

    let (status_code, status_str) = if encryption_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        encryption_ready,
        sales_stored,
        sales_persons_stored,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}
