use axum::Json;
use axum::extract::State;
use smartcenter_shared::{StatusMap, UpdateStatusRequest, UpdateStatusResponse};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (district_count, last_update) = {
        let store = state.store.read().await;
        (
            store.districts.len(),
            store.last_update.map(|at| at.to_rfc3339()),
        )
    };
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "districts": district_count,
        "subscribers": state.event_tx.receiver_count(),
        "last_update": last_update,
        "observability": {
            "updates_accepted_total": observability.updates_accepted_total,
            "updates_rejected_total": observability.updates_rejected_total,
            "lagged_events_total": observability.lagged_events_total,
        }
    }))
}

pub async fn get_district_status(State(state): State<AppState>) -> Json<StatusMap> {
    Json(state.status_map().await)
}

pub async fn update_status(
    State(state): State<AppState>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, ApiError> {
    let update = state
        .apply_update(&request.district, &request.status)
        .await
        .inspect_err(|e| {
            warn!(
                district = %request.district,
                status = %request.status,
                error = %e,
                "rejected status update"
            );
        })?;

    Ok(Json(UpdateStatusResponse {
        success: true,
        district: update.district,
        status: update.status,
        color: update.color,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use smartcenter_shared::{DistrictStatus, StatusMap, StatusUpdate, UpdateStatusResponse};
    use tower::ServiceExt;

    use crate::state::AppState;

    const BODY_LIMIT: usize = 64 * 1024;

    fn state() -> AppState {
        let ids: Vec<String> = ["A", "B", "C"].iter().map(|id| id.to_string()).collect();
        AppState::new(&ids, "client/dist".to_string())
    }

    fn update_request(body: &str) -> Request<Body> {
        Request::post("/api/update-status")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request")
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("parse body")
    }

    #[tokio::test]
    async fn district_status_lists_every_district_as_normal() {
        let app = crate::app::build_app(state());
        let response = app
            .oneshot(
                Request::get("/api/district-status")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("route responds");
        assert_eq!(response.status(), StatusCode::OK);

        let map: StatusMap = json_body(response).await;
        assert_eq!(map.len(), 3);
        assert!(map.values().all(|state| state.status == DistrictStatus::Normal));
        assert!(map.values().all(|state| state.color == "#5698c3"));
    }

    #[tokio::test]
    async fn valid_update_responds_and_broadcasts() {
        let state = state();
        let mut rx = state.event_tx.subscribe();
        let app = crate::app::build_app(state.clone());

        let response = app
            .oneshot(update_request(r#"{"district": "C", "status": "warning"}"#))
            .await
            .expect("route responds");
        assert_eq!(response.status(), StatusCode::OK);

        let body: UpdateStatusResponse = json_body(response).await;
        assert!(body.success);
        assert_eq!(body.district, "C");
        assert_eq!(body.status, DistrictStatus::Warning);
        assert_eq!(body.color, "#ffc107");

        let event = rx.recv().await.expect("update broadcast");
        let sent: StatusUpdate = serde_json::from_slice(&event.json).expect("valid payload");
        assert_eq!(sent.district, "C");
        assert_eq!(sent.color, "#ffc107");
    }

    #[tokio::test]
    async fn unknown_district_is_bad_request() {
        let app = crate::app::build_app(state());
        let response = app
            .oneshot(update_request(r#"{"district": "Q", "status": "warning"}"#))
            .await
            .expect("route responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = json_body(response).await;
        let message = body
            .get("error")
            .and_then(|v| v.as_str())
            .expect("error message");
        assert!(message.contains("unknown district"));
    }

    #[tokio::test]
    async fn invalid_status_is_bad_request() {
        let state = state();
        let app = crate::app::build_app(state.clone());
        let response = app
            .oneshot(update_request(r#"{"district": "A", "status": "offline"}"#))
            .await
            .expect("route responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            state.status_map().await["A"].status,
            DistrictStatus::Normal
        );
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let state = state();
        state
            .apply_update("A", "warning")
            .await
            .expect("update accepted");
        let app = crate::app::build_app(state);

        let response = app
            .oneshot(
                Request::get("/api/health")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("route responds");
        let health: serde_json::Value = json_body(response).await;

        assert_eq!(health.get("status").and_then(|v| v.as_str()), Some("ok"));
        assert_eq!(health.get("districts").and_then(|v| v.as_u64()), Some(3));
        assert!(health.get("last_update").and_then(|v| v.as_str()).is_some());
        assert_eq!(
            health
                .get("observability")
                .and_then(|v| v.get("updates_accepted_total"))
                .and_then(|v| v.as_u64()),
            Some(1)
        );
    }
}
