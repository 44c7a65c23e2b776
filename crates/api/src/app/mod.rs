pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use mercora_auth::{Hs256JwtValidator, JwtValidator};
use mercora_events::{Notifier, TracingNotifier};
use mercora_pricing::PricingEngine;
use mercora_storage::{MemoryStore, PostgresStore, Store};

use crate::config::AppConfig;
use crate::middleware::{self, AuthState};
use services::AppState;

/// Assemble the full application router.
///
/// `/health` and the two catalog reads stay outside the auth middleware;
/// everything else requires a verified bearer token.
pub async fn build_app(config: AppConfig) -> anyhow::Result<Router> {
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, running on the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let state = Arc::new(AppState::new(
        store,
        PricingEngine::new(config.pricing),
        notifier,
    ));

    let jwt: Arc<dyn JwtValidator> = Arc::new(Hs256JwtValidator::new(&config.jwt_secret));
    let auth_state = AuthState { jwt };

    let protected = routes::router()
        .layer(Extension(state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    let public = Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::products::public_router())
        .layer(Extension(state));

    Ok(public.merge(protected).layer(ServiceBuilder::new()))
}
