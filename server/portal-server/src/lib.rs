//! Agent portal HTTP server
//!
//! Thin axum front end over `auth-rebac`:
//! - `GET  /api/healthz`: liveness
//! - `GET  /api/v1/me`: the caller identity forwarded by the authenticating proxy
//! - `POST /api/v1/authorize`: decision endpoint for the proxy's remote authorizer
//! - `POST /api/internal/hooks/kratos/registration`: identity-provider
//!   registration webhook, guarded by HTTP Basic auth

pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod settings;

pub use error::ApiError;
pub use identity::Identity;
pub use settings::PortalSettings;

use auth_rebac::{AuthorizationResolver, MembershipSynchronizer, RelationLayout, RelationTupleClient};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use logger_redacted::Redactor;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::settings::{IdentityHeaders, WebhookCredentials};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<AuthorizationResolver>,
    pub memberships: Arc<MembershipSynchronizer>,
    pub identity_headers: Arc<IdentityHeaders>,
    pub webhook: Arc<WebhookCredentials>,
    pub redactor: Redactor,
}

impl AppState {
    pub fn new(client: Arc<dyn RelationTupleClient>, settings: &PortalSettings) -> Self {
        let layout = RelationLayout::from_config(&settings.keto);
        Self {
            authorizer: Arc::new(AuthorizationResolver::new(client.clone(), layout.clone())),
            memberships: Arc::new(MembershipSynchronizer::new(client, layout)),
            identity_headers: Arc::new(settings.identity.clone()),
            webhook: Arc::new(settings.webhook.clone()),
            redactor: Redactor::default(),
        }
    }
}

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let hooks = Router::new()
        .route(
            "/internal/hooks/kratos/registration",
            post(handlers::registration_hook),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_webhook_auth,
        ));

    let api = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/v1/me", get(handlers::me))
        .route("/v1/authorize", post(handlers::authorize))
        .merge(hooks);

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer()),
        )
        .with_state(state)
}
