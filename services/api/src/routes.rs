use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::atomic::Ordering;
use wlb::serving::{serving_router, ServingState};

/// Prediction routes plus `/health`, `/ready`, and `/metrics`.
pub(crate) fn with_operational_routes(serving: ServingState) -> axum::Router {
    serving_router(serving)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Relaxed) {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;
    use wlb::model::{ClassCode, ModelError, Predictor};
    use wlb::table::Table;

    struct AlwaysAverage;

    impl Predictor for AlwaysAverage {
        fn predict(&self, table: &Table) -> Result<Vec<ClassCode>, ModelError> {
            Ok(vec![ClassCode::Int(1); table.len()])
        }

        fn classes(&self) -> &[ClassCode] {
            &[]
        }
    }

    fn app_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let response = readiness_endpoint(Extension(app_state(false)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = readiness_endpoint(Extension(app_state(true)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn operational_routes_sit_beside_prediction_routes() {
        let serving = ServingState::new(Arc::new(AlwaysAverage), vec!["DAILY_STRESS".to_string()]);
        let app = with_operational_routes(serving).layer(Extension(app_state(true)));

        let health = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("health response");
        assert_eq!(health.status(), StatusCode::OK);

        let columns = app
            .oneshot(Request::get("/columns").body(Body::empty()).expect("request"))
            .await
            .expect("columns response");
        assert_eq!(columns.status(), StatusCode::OK);
    }
}
