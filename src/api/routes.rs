//! API route definitions

use crate::service::{AccountService, BookService, TokenVerifier};
use axum::{
    Router, middleware,
    routing::{MethodRouter, get, on},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::table::{AccountCapability, BookCapability, Capability, RouteDescriptor, RouteTable};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub accounts: Arc<dyn AccountService>,
    pub books: Arc<dyn BookService>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
}

/// Bind one descriptor to the handler for its capability
fn bind(route: &RouteDescriptor) -> MethodRouter<AppState> {
    let filter = route.method.filter();

    match route.capability {
        Capability::Account(c) => match c {
            AccountCapability::GetAll => on(filter, handlers::list_accounts),
            AccountCapability::GetOne => on(filter, handlers::get_account),
            AccountCapability::Login => on(filter, handlers::login),
            AccountCapability::Register => on(filter, handlers::register_account),
            AccountCapability::Create => on(filter, handlers::create_account),
            AccountCapability::Update => on(filter, handlers::update_account),
            AccountCapability::Updates => on(filter, handlers::update_accounts),
            AccountCapability::Delete => on(filter, handlers::delete_account),
            AccountCapability::Deletes => on(filter, handlers::delete_accounts),
        },
        Capability::Book(c) => match c {
            BookCapability::GetAll => on(filter, handlers::list_books),
            BookCapability::GetOne => on(filter, handlers::get_book),
            BookCapability::Create => on(filter, handlers::create_book),
            BookCapability::Update => on(filter, handlers::update_book),
            BookCapability::Delete => on(filter, handlers::delete_book),
        },
    }
}

/// Create the main API router
///
/// Every descriptor in `state.routes` is registered once. Routes under
/// `/auth/` sit behind the token guard.
pub fn create_router(state: AppState) -> Router {
    let mut public = Router::new();
    let mut protected = Router::new();
    let mut has_protected = false;

    for route in state.routes.iter() {
        let path = route.axum_path();
        tracing::debug!(route = %route, auth = route.auth_required(), "Binding route");

        if route.auth_required() {
            protected = protected.route(&path, bind(route));
            has_protected = true;
        } else {
            public = public.route(&path, bind(route));
        }
    }

    // route_layer panics on a router without routes
    if has_protected {
        protected = protected.route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_token,
        ));
    }

    Router::new()
        // Health and status
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Resource routes
        .merge(public)
        .merge(protected)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
