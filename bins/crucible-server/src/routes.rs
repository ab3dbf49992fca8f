use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, session, AppState};

/// Assemble the router. `/execute` sits behind the session gate; the
/// health check does not.
pub fn routes(state: Arc<AppState>) -> Router {
    let gated = Router::new()
        .route("/execute", post(handlers::execute))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    Router::new()
        .route("/status", get(handlers::health_check))
        .merge(gated)
        .with_state(state)
}
