//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use super::AppState;
use super::driver::DriverError;
use super::types::{ErrorResponse, ModeRequest, ResetRequest};
use crate::devices::Topology;
use crate::sim::billing::BillingScope;
use crate::sim::command::Command;
use crate::sim::types::Snapshot;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn unavailable(err: DriverError) -> ApiError {
    warn!(%err, "command rejected");
    error(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
}

/// Returns the latest published snapshot.
///
/// `GET /state` → 200 + `Snapshot` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.client.latest())
}

/// Returns the static plant description.
///
/// `GET /topology` → 200 + `Topology` JSON
pub async fn get_topology(State(state): State<Arc<AppState>>) -> Json<Topology> {
    Json(state.topology.clone())
}

/// Switches the watering mode.
///
/// `POST /mode` `{"mode":"off"}` → 200 + post-command `Snapshot`
pub async fn post_mode(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ModeRequest>,
) -> Result<Json<Snapshot>, ApiError> {
    state
        .client
        .send(Command::SetWateringMode(req.mode))
        .await
        .map(Json)
        .map_err(unavailable)
}

/// Resets billing for one consumer or all of them.
///
/// `POST /billing/reset` `{}` → 200 + post-command `Snapshot`
/// `POST /billing/reset` `{"consumer":"house-a"}` → 200, or 404 if unknown
pub async fn post_billing_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<Snapshot>, ApiError> {
    let scope = match req.consumer {
        None => BillingScope::All,
        Some(id) if state.topology.consumers.contains(&id) => BillingScope::Consumer(id),
        Some(id) => {
            return Err(error(
                StatusCode::NOT_FOUND,
                format!("unknown consumer \"{id}\""),
            ));
        }
    };
    state
        .client
        .send(Command::ResetBilling(scope))
        .await
        .map(Json)
        .map_err(unavailable)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::{LiveHandle, driver, router};
    use crate::config::ScenarioConfig;
    use crate::sensor::UniformSensor;

    /// The handle must outlive the test; dropping it stops the driver.
    fn make_test_state() -> (Arc<AppState>, LiveHandle<UniformSensor>) {
        let engine = ScenarioConfig::multi_house().engine().unwrap();
        let topology = engine.plant().topology();
        let handle = driver::spawn(engine, Duration::from_secs(3600));
        let state = Arc::new(AppState {
            client: handle.client(),
            topology,
        });
        (state, handle)
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn state_returns_200() {
        let (state, _handle) = make_test_state();
        let app = router(state);

        let req = Request::builder()
            .uri("/state")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = json_body(resp).await;
        assert_eq!(json["tick"], 0);
        assert_eq!(json["mode"], "auto");
        assert_eq!(json["tanks"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["consumers"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn topology_lists_wiring() {
        let (state, _handle) = make_test_state();
        let app = router(state);

        let req = Request::builder()
            .uri("/topology")
            .body(Body::empty())
            .unwrap();
        let json = json_body(app.oneshot(req).await.unwrap()).await;
        assert_eq!(json["pumps"][1]["source"], "underground");
        assert_eq!(json["pumps"][1]["min_source_percent"], 40.0);
    }

    #[tokio::test]
    async fn mode_change_is_reflected() {
        let (state, _handle) = make_test_state();
        let app = router(state);

        let resp = app
            .oneshot(post("/mode", r#"{"mode":"off"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["mode"], "off");
    }

    #[tokio::test]
    async fn invalid_mode_is_rejected() {
        let (state, _handle) = make_test_state();
        let app = router(state);

        let resp = app
            .oneshot(post("/mode", r#"{"mode":"sometimes"}"#))
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn reset_unknown_consumer_returns_404() {
        let (state, _handle) = make_test_state();
        let app = router(state);

        let resp = app
            .oneshot(post("/billing/reset", r#"{"consumer":"house-z"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = json_body(resp).await;
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn reset_all_returns_snapshot() {
        let (state, _handle) = make_test_state();
        let app = router(state);

        let resp = app.oneshot(post("/billing/reset", "{}")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["total_bill"], 0.0);
    }
}
