//! dync-api — REST API for the cluster daemon.
//!
//! Provides axum route handlers over the orchestrator. Caller identity
//! arrives in request headers, populated by the authentication layer in
//! front of the daemon.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/clusters` | List clusters visible to the caller |
//! | POST | `/api/v1/clusters` | Allocate a cluster |
//! | DELETE | `/api/v1/clusters` | Kill every visible cluster |
//! | GET | `/api/v1/clusters/{id}` | Get one cluster |
//! | DELETE | `/api/v1/clusters/{id}` | Kill one cluster |
//! | POST | `/api/v1/clusters/{id}/refresh` | Extend a cluster's expiry |

pub mod handlers;

use axum::routing::{get, post};
use axum::Router;

use dync_orchestrator::Orchestrator;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Orchestrator,
}

/// Build the complete API router.
pub fn build_router(orchestrator: Orchestrator) -> Router {
    let state = ApiState { orchestrator };

    let api_routes = Router::new()
        .route(
            "/clusters",
            get(handlers::list_clusters)
                .post(handlers::create_cluster)
                .delete(handlers::kill_all_clusters),
        )
        .route(
            "/clusters/{id}",
            get(handlers::get_cluster).delete(handlers::kill_cluster),
        )
        .route("/clusters/{id}/refresh", post(handlers::refresh_cluster))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}
