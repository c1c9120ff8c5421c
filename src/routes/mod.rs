use axum::Router;

use crate::state::SharedState;

pub mod activity;
pub mod docs;
pub mod health;
pub mod sessions;
pub mod sse;

/// Every route of the service with the shared state attached.
pub fn router(state: SharedState) -> Router<()> {
    Router::new()
        .merge(health::router())
        .merge(sse::router())
        .merge(activity::router())
        .merge(sessions::router())
        .merge(docs::router())
        .with_state(state)
}
