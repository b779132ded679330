use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::services::{
    CredentialService, ImageHost, NotificationSender, RosterService, VerificationWorkflow,
};
use crate::state::{Collaborators, SharedState};

pub mod auth;
mod contact;
mod error;
mod events;
mod gallery;
mod observability;
pub mod otp;
mod roster;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub async fn config(&self) -> Config {
        self.shared.config().await
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialService> {
        &self.shared.credentials
    }

    #[must_use]
    pub fn verification(&self) -> &VerificationWorkflow {
        &self.shared.verification
    }

    #[must_use]
    pub fn roster(&self) -> &Arc<dyn RosterService> {
        &self.shared.roster
    }

    #[must_use]
    pub fn image_host(&self) -> &Arc<dyn ImageHost> {
        &self.shared.image_host
    }

    #[must_use]
    pub fn notifier(&self) -> Arc<dyn NotificationSender> {
        self.shared.notifier.clone()
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

/// Builds state around in-process collaborators instead of the configured ones.
pub async fn create_app_state_with_collaborators(
    config: Config,
    collaborators: Collaborators,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_collaborators(config, collaborators).await?);
    Ok(create_app_state(shared, None))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let config = state.config().await;

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(60)));

    let api_router = Router::new()
        .merge(account_routes())
        .merge(roster_routes())
        .merge(content_routes())
        .route("/health", get(system::health))
        .route("/metrics", get(observability::get_metrics))
        .layer(session_layer)
        .with_state(state);

    let cors_origins = &config.server.cors_allowed_origins;
    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(middleware::from_fn_with_state(
            config.request_timeout(),
            observability::timeout_middleware,
        ))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
        .layer(cors_layer.allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn account_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/otp/request", post(otp::request_otp))
        .route("/otp/verify", post(otp::verify_otp))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::get_current_user))
        .route("/users", get(users::list_users))
        .route("/users/{id}", axum::routing::delete(users::delete_user))
}

fn roster_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/roster/year-ranges", get(roster::list_year_ranges))
        .route(
            "/roster/members",
            get(roster::list_members).post(roster::add_member),
        )
        .route(
            "/roster/members/{id}",
            axum::routing::delete(roster::delete_member),
        )
        .route("/roster/year-visibility", post(roster::set_year_visibility))
        .route("/roster/hidden-years", get(roster::list_hidden_years))
        .route("/roster/toggle-delete", post(roster::hide_toggle_delete))
        .route(
            "/roster/role-ranks",
            get(roster::list_roles).post(roster::add_role),
        )
}

fn content_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/{id}",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/gallery",
            get(gallery::list_images).post(gallery::upload_image),
        )
        .route("/contact", post(contact::send_message))
}
