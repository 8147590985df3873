//! Health endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use super::AppState;
use crate::context;

/// Body of `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `starting`, `ready`, `draining` or `stopped`.
    pub status: String,
    /// Trace id of this very request.
    pub trace_id: Option<String>,
    /// Store calls currently running on blocking workers.
    pub in_flight: u64,
    pub uptime_secs: u64,
}

/// Always 200; `status` tells monitors whether the gateway is actually serving.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Gateway is up", body = HealthResponse)),
    tag = "operations"
)]
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: state.shutdown.health_state().as_str().to_string(),
        trace_id: context::current_trace_id().map(|id| id.into_string()),
        in_flight: state.shutdown.in_flight_count(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use ragway_core::{RequestContext, TraceId};

    use super::*;
    use crate::network::handlers::test_support::test_state;

    #[tokio::test]
    async fn reports_lifecycle_state() {
        let state = test_state();
        assert_eq!(health_handler(State(state.clone())).await.status, "starting");

        state.shutdown.set_ready();
        assert_eq!(health_handler(State(state.clone())).await.status, "ready");

        state.shutdown.trigger_shutdown();
        assert_eq!(health_handler(State(state)).await.status, "draining");
    }

    #[tokio::test]
    async fn reports_in_flight_work() {
        let state = test_state();
        let _guard = state.shutdown.in_flight_guard();
        assert_eq!(health_handler(State(state)).await.in_flight, 1);
    }

    #[tokio::test]
    async fn echoes_the_request_trace_id() {
        let state = test_state();
        let ctx = RequestContext::new(TraceId::new("health-probe"));

        let body = context::scope(ctx, health_handler(State(state))).await;

        assert_eq!(body.trace_id.as_deref(), Some("health-probe"));
    }

    #[tokio::test]
    async fn trace_id_is_absent_outside_a_request() {
        let body = health_handler(State(test_state())).await;
        assert!(body.trace_id.is_none());
    }
}
