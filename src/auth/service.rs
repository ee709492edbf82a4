//! Token guard middleware for Axum

use super::{INVALID_TOKEN, TokenQuery};
use crate::api::routes::AppState;
use crate::api::table::HttpMethod;
use crate::error::ApiError;
use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};

/// Axum middleware for the `/auth/` routes
///
/// Reads `access_token` from the query string and resolves it through the
/// configured verifier. On success the [`Principal`](crate::service::Principal)
/// is stored in request extensions and the request continues.
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let resolved = HttpMethod::from_method(request.method())
        .and_then(|method| state.routes.resolve(method, request.uri().path()))
        .map(|route| route.capability);
    let capability = resolved.map(|c| c.name()).unwrap_or("unknown");

    let query = Query::<TokenQuery>::try_from_uri(request.uri())
        .map(|Query(query)| query)
        .unwrap_or_default();

    let Some(token) = query.token() else {
        tracing::debug!(capability, path = %request.uri().path(), "Missing access token");
        crate::metrics::record_token_rejected(resolved);
        return Err(ApiError::Unauthorized(INVALID_TOKEN));
    };

    match state.verifier.verify(token).await {
        Ok(principal) => {
            tracing::debug!(
                capability,
                account = %principal.account_id,
                "Access token accepted"
            );
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::warn!(capability, error = %e, "Access token rejected");
            crate::metrics::record_token_rejected(resolved);
            Err(ApiError::Unauthorized(INVALID_TOKEN))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::table::RouteTable;
    use crate::error::{ServiceError, ServiceResult};
    use crate::service::{MemoryAccountService, MemoryBookService, Principal, TokenVerifier};
    use async_trait::async_trait;
    use axum::{
        Extension, Router,
        body::Body,
        http::{Request as AxumRequest, StatusCode},
        middleware,
        routing::get,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct FixedVerifier {
        token: &'static str,
    }

    #[async_trait]
    impl TokenVerifier for FixedVerifier {
        async fn verify(&self, token: &str) -> ServiceResult<Principal> {
            if token == self.token {
                Ok(Principal {
                    account_id: "7".to_string(),
                })
            } else {
                Err(ServiceError::Unauthorized("unknown token".to_string()))
            }
        }
    }

    fn guarded_app() -> Router {
        let state = AppState {
            routes: Arc::new(RouteTable::standard()),
            accounts: Arc::new(MemoryAccountService::new()),
            books: Arc::new(MemoryBookService::new()),
            verifier: Arc::new(FixedVerifier { token: "good" }),
            prometheus_handle: PrometheusBuilder::new().build_recorder().handle(),
        };

        Router::new()
            .route(
                "/test",
                get(|Extension(principal): Extension<Principal>| async move {
                    principal.account_id
                }),
            )
            .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
            .with_state(state)
    }

    async fn status_for(uri: &str) -> StatusCode {
        guarded_app()
            .oneshot(AxumRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        assert_eq!(status_for("/test?access_token=good").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        assert_eq!(status_for("/test").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        assert_eq!(
            status_for("/test?access_token=bad").await,
            StatusCode::BAD_REQUEST
        );
    }
}
