//! API request handlers
//!
//! Each handler calls one service operation and folds the outcome into the
//! response envelope. Service errors never reach the client verbatim; they
//! are logged and replaced by the capability's failure code.

use super::models::{DeletedCount, Envelope, HealthResponse};
use super::routes::AppState;
use super::table::{AccountCapability, BookCapability, Capability};
use crate::error::{ApiError, ServiceResult};
use crate::service::{
    Account, AccountPatch, Book, BookPatch, LoginRequest, NewAccount, NewBook, Session,
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

type Reply<T> = Result<Json<Envelope<T>>, ApiError>;

/// Wrap a service result in the envelope, recording the outcome
fn reply<T>(capability: Capability, result: ServiceResult<T>) -> Reply<T> {
    match result {
        Ok(data) => {
            crate::metrics::record_request(capability, true);
            Ok(Json(Envelope::ok(data)))
        }
        Err(e) => {
            tracing::warn!(
                group = capability.group().name(),
                capability = capability.name(),
                error = %e,
                "Service call failed"
            );
            crate::metrics::record_request(capability, false);
            Err(capability.failure())
        }
    }
}

/// Unwrap a JSON body, reporting a malformed one with the capability's code
fn body<T>(capability: Capability, payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(
                group = capability.group().name(),
                capability = capability.name(),
                error = %rejection.body_text(),
                "Rejected request body"
            );
            crate::metrics::record_request(capability, false);
            Err(capability.failure())
        }
    }
}

/// Unwrap the `:id` path segment, reporting a rejection with the capability's code
fn path_id(
    capability: Capability,
    path: Result<Path<String>, PathRejection>,
) -> Result<String, ApiError> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            tracing::debug!(
                group = capability.group().name(),
                capability = capability.name(),
                error = %rejection.body_text(),
                "Rejected path parameter"
            );
            crate::metrics::record_request(capability, false);
            Err(capability.failure())
        }
    }
}

/// GET /health - Service health check
pub async fn health() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now(),
        }),
    )
}

/// GET /metrics - Prometheus metrics
pub async fn metrics(State(state): State<AppState>) -> String {
    state.prometheus_handle.render()
}

// ============================================================================
// Accounts
// ============================================================================

/// GET /api/v1/auth/accounts
pub async fn list_accounts(State(state): State<AppState>) -> Reply<Vec<Account>> {
    let capability = Capability::Account(AccountCapability::GetAll);
    reply(capability, state.accounts.list().await)
}

/// GET /api/v1/auth/accounts/:id
pub async fn get_account(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Reply<Account> {
    let capability = Capability::Account(AccountCapability::GetOne);
    let id = path_id(capability, path)?;
    reply(capability, state.accounts.get(&id).await)
}

/// POST /api/v1/accounts/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Reply<Session> {
    let capability = Capability::Account(AccountCapability::Login);
    let request = body(capability, payload)?;
    reply(capability, state.accounts.login(request).await)
}

/// POST /api/v1/accounts/register
pub async fn register_account(
    State(state): State<AppState>,
    payload: Result<Json<NewAccount>, JsonRejection>,
) -> Reply<Account> {
    let capability = Capability::Account(AccountCapability::Register);
    let request = body(capability, payload)?;
    reply(capability, state.accounts.register(request).await)
}

/// POST /api/v1/accounts
pub async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<NewAccount>, JsonRejection>,
) -> Reply<Account> {
    let capability = Capability::Account(AccountCapability::Create);
    let request = body(capability, payload)?;
    reply(capability, state.accounts.register(request).await)
}

/// PUT /api/v1/auth/accounts/:id
pub async fn update_account(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<AccountPatch>, JsonRejection>,
) -> Reply<Account> {
    let capability = Capability::Account(AccountCapability::Update);
    let id = path_id(capability, path)?;
    let patch = body(capability, payload)?;
    reply(capability, state.accounts.update(&id, patch).await)
}

/// PUT /api/v1/auth/accounts
pub async fn update_accounts(
    State(state): State<AppState>,
    payload: Result<Json<AccountPatch>, JsonRejection>,
) -> Reply<Vec<Account>> {
    let capability = Capability::Account(AccountCapability::Updates);
    let patch = body(capability, payload)?;
    reply(capability, state.accounts.update_all(patch).await)
}

/// DELETE /api/v1/auth/accounts/:id
pub async fn delete_account(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Reply<Account> {
    let capability = Capability::Account(AccountCapability::Delete);
    let id = path_id(capability, path)?;
    reply(capability, state.accounts.remove(&id).await)
}

/// DELETE /api/v1/auth/accounts
pub async fn delete_accounts(State(state): State<AppState>) -> Reply<DeletedCount> {
    let capability = Capability::Account(AccountCapability::Deletes);
    let result = state
        .accounts
        .remove_all()
        .await
        .map(|deleted| DeletedCount { deleted });
    reply(capability, result)
}

// ============================================================================
// Books
// ============================================================================

/// GET /api/v1/books
pub async fn list_books(State(state): State<AppState>) -> Reply<Vec<Book>> {
    let capability = Capability::Book(BookCapability::GetAll);
    reply(capability, state.books.list().await)
}

/// GET /api/v1/books/:id
pub async fn get_book(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Reply<Book> {
    let capability = Capability::Book(BookCapability::GetOne);
    let id = path_id(capability, path)?;
    reply(capability, state.books.get(&id).await)
}

/// POST /api/v1/auth/books
pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> Reply<Book> {
    let capability = Capability::Book(BookCapability::Create);
    let request = body(capability, payload)?;
    reply(capability, state.books.create(request).await)
}

/// PUT /api/v1/auth/books/:id
pub async fn update_book(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<BookPatch>, JsonRejection>,
) -> Reply<Book> {
    let capability = Capability::Book(BookCapability::Update);
    let id = path_id(capability, path)?;
    let patch = body(capability, payload)?;
    reply(capability, state.books.update(&id, patch).await)
}

/// DELETE /api/v1/auth/books/:id
pub async fn delete_book(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Reply<Book> {
    let capability = Capability::Book(BookCapability::Delete);
    let id = path_id(capability, path)?;
    reply(capability, state.books.remove(&id).await)
}
