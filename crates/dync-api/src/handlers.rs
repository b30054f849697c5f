//! REST API handlers.
//!
//! Each handler resolves the caller context from headers, delegates to
//! the orchestrator and maps the error taxonomy onto status codes.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use dync_core::RequestContext;
use dync_orchestrator::{ClusterError, ClusterOptions, NodeOptions};

use crate::ApiState;

/// Header carrying the authenticated caller identity.
pub const USER_HEADER: &str = "x-dyncluster-user";

/// Header carrying the administrative ownership override.
pub const IGNORE_OWNERSHIP_HEADER: &str = "x-dyncluster-ignore-ownership";

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> axum::response::Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

fn cluster_error_response(err: &ClusterError) -> axum::response::Response {
    let status = match err {
        ClusterError::InvalidRequest(_) | ClusterError::Version(_) => StatusCode::BAD_REQUEST,
        ClusterError::NotFound(_) => StatusCode::NOT_FOUND,
        ClusterError::Forbidden => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(&err.to_string(), status)
}

/// Resolve the caller context from request headers.
///
/// The authentication layer in front of the daemon sets these; a
/// request without an identity is rejected.
fn request_context(headers: &HeaderMap) -> Result<RequestContext, axum::response::Response> {
    let user = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| error_response("missing caller identity", StatusCode::UNAUTHORIZED))?;

    let ignore_ownership = headers
        .get(IGNORE_OWNERSHIP_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    Ok(RequestContext::new(user).with_ignore_ownership(ignore_ownership))
}

// ── Request/response bodies ────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
pub struct CreateNodeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    pub server_version: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct CreateClusterRequest {
    pub timeout_secs: u64,
    #[serde(default)]
    pub nodes: Vec<CreateNodeRequest>,
}

#[derive(Debug, serde::Deserialize)]
pub struct RefreshClusterRequest {
    pub timeout_secs: u64,
}

#[derive(serde::Serialize)]
struct CreatedCluster {
    id: String,
}

impl From<CreateClusterRequest> for ClusterOptions {
    fn from(req: CreateClusterRequest) -> Self {
        ClusterOptions {
            timeout: Duration::from_secs(req.timeout_secs),
            nodes: req
                .nodes
                .into_iter()
                .map(|n| NodeOptions {
                    name: n.name,
                    platform: n.platform,
                    server_version: n.server_version,
                })
                .collect(),
        }
    }
}

// ── Clusters ───────────────────────────────────────────────────────

/// GET /api/v1/clusters
pub async fn list_clusters(State(state): State<ApiState>, headers: HeaderMap) -> impl IntoResponse {
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };
    match state.orchestrator.get_all_clusters(&ctx).await {
        Ok(clusters) => ApiResponse::ok(clusters).into_response(),
        Err(e) => cluster_error_response(&e),
    }
}

/// GET /api/v1/clusters/{id}
pub async fn get_cluster(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };
    match state.orchestrator.get_cluster(&ctx, &id).await {
        Ok(cluster) => ApiResponse::ok(cluster).into_response(),
        Err(e) => cluster_error_response(&e),
    }
}

/// POST /api/v1/clusters
pub async fn create_cluster(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(req): Json<CreateClusterRequest>,
) -> impl IntoResponse {
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };
    match state.orchestrator.allocate_cluster(&ctx, req.into()).await {
        Ok(id) => (StatusCode::CREATED, ApiResponse::ok(CreatedCluster { id })).into_response(),
        Err(e) => cluster_error_response(&e),
    }
}

/// DELETE /api/v1/clusters/{id}
pub async fn kill_cluster(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };
    match state.orchestrator.kill_cluster(&ctx, &id).await {
        Ok(()) => ApiResponse::ok(serde_json::json!({
            "cluster": id,
            "status": "killed"
        }))
        .into_response(),
        Err(e) => cluster_error_response(&e),
    }
}

/// DELETE /api/v1/clusters
pub async fn kill_all_clusters(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };
    match state.orchestrator.kill_all_clusters(&ctx).await {
        Ok(()) => ApiResponse::ok(serde_json::json!({ "status": "killed" })).into_response(),
        Err(e) => cluster_error_response(&e),
    }
}

/// POST /api/v1/clusters/{id}/refresh
pub async fn refresh_cluster(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<RefreshClusterRequest>,
) -> impl IntoResponse {
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };
    match state
        .orchestrator
        .refresh_cluster(&ctx, &id, Duration::from_secs(req.timeout_secs))
        .await
    {
        Ok(()) => ApiResponse::ok(serde_json::json!({
            "cluster": id,
            "status": "refreshed"
        }))
        .into_response(),
        Err(e) => cluster_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dync_core::DaemonConfig;
    use dync_orchestrator::Orchestrator;
    use dync_runtime::memory::MemoryRuntime;
    use dync_store::{MetaStore, RedbMetaStore};

    fn test_state() -> (ApiState, RedbMetaStore) {
        let runtime = Arc::new(MemoryRuntime::new());
        let store = RedbMetaStore::open_in_memory().unwrap();
        let orchestrator = Orchestrator::new(
            runtime,
            Arc::new(store.clone()),
            None,
            Arc::new(DaemonConfig::default()),
        );
        (ApiState { orchestrator }, store)
    }

    fn headers_for(user: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, user.parse().unwrap());
        headers
    }

    fn create_request(count: usize) -> CreateClusterRequest {
        CreateClusterRequest {
            timeout_secs: 3600,
            nodes: (0..count)
                .map(|_| CreateNodeRequest {
                    name: None,
                    platform: None,
                    server_version: "7.0.0".to_string(),
                })
                .collect(),
        }
    }

    async fn create_cluster_as(state: &ApiState, user: &str) -> String {
        // Allocate through the orchestrator to keep the handler tests
        // focused on one endpoint each.
        state
            .orchestrator
            .allocate_cluster(
                &dync_core::RequestContext::new(user),
                create_request(1).into(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn missing_identity_is_unauthorized() {
        let (state, _store) = test_state();
        let resp = list_clusters(State(state), HeaderMap::new()).await.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn list_clusters_empty() {
        let (state, _store) = test_state();
        let resp = list_clusters(State(state), headers_for("alice")).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_cluster_returns_created() {
        let (state, _store) = test_state();
        let resp = create_cluster(State(state), headers_for("alice"), Json(create_request(2)))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn create_cluster_without_nodes_is_bad_request() {
        let (state, _store) = test_state();
        let resp = create_cluster(State(state), headers_for("alice"), Json(create_request(0)))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_cluster_with_bad_version_is_bad_request() {
        let (state, _store) = test_state();
        let mut req = create_request(1);
        req.nodes[0].server_version = "not-a-version".to_string();
        let resp = create_cluster(State(state), headers_for("alice"), Json(req))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_cluster_roundtrip() {
        let (state, _store) = test_state();
        let id = create_cluster_as(&state, "alice").await;

        let resp = get_cluster(State(state), headers_for("alice"), Path(id))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn get_unknown_cluster_is_not_found() {
        let (state, _store) = test_state();
        let resp = get_cluster(State(state), headers_for("alice"), Path("deadbeef".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn foreign_cluster_is_hidden_without_override() {
        let (state, _store) = test_state();
        let id = create_cluster_as(&state, "bob").await;

        let resp = get_cluster(
            State(state.clone()),
            headers_for("alice"),
            Path(id.clone()),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let mut headers = headers_for("alice");
        headers.insert(IGNORE_OWNERSHIP_HEADER, "true".parse().unwrap());
        let resp = get_cluster(State(state), headers, Path(id)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn kill_cluster_without_ownership_is_forbidden() {
        let (state, store) = test_state();
        let id = create_cluster_as(&state, "alice").await;

        // Ownership moved elsewhere since creation.
        store
            .update(&id, &|mut meta| {
                meta.owner = "bob".to_string();
                meta
            })
            .unwrap();

        let resp = kill_cluster(State(state), headers_for("alice"), Path(id))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn kill_unknown_cluster_is_not_found() {
        let (state, _store) = test_state();
        let resp = kill_cluster(State(state), headers_for("alice"), Path("deadbeef".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn full_lifecycle_through_handlers() {
        let (state, _store) = test_state();

        let id = create_cluster_as(&state, "alice").await;

        let resp = refresh_cluster(
            State(state.clone()),
            headers_for("alice"),
            Path(id.clone()),
            Json(RefreshClusterRequest { timeout_secs: 7200 }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = kill_cluster(State(state.clone()), headers_for("alice"), Path(id.clone()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = get_cluster(State(state), headers_for("alice"), Path(id))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn kill_all_clusters_returns_ok() {
        let (state, _store) = test_state();
        create_cluster_as(&state, "alice").await;
        create_cluster_as(&state, "alice").await;

        let resp = kill_all_clusters(State(state.clone()), headers_for("alice"))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = list_clusters(State(state), headers_for("alice")).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
