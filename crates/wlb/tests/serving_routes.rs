use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wlb::config::ModelConfig;
use wlb::model::{ClassCode, ModelError, Predictor};
use wlb::serving::{serving_router, ServingError, ServingState};
use wlb::table::Table;

/// Buckets daily stress: low stress is Good, high stress is Bad.
struct StressBands {
    columns: Vec<String>,
    classes: Vec<ClassCode>,
}

impl StressBands {
    fn new() -> Self {
        Self {
            columns: vec![
                "Timestamp".to_string(),
                "DAILY_STRESS".to_string(),
                "SLEEP_HOURS".to_string(),
            ],
            classes: vec![ClassCode::Int(0), ClassCode::Int(1), ClassCode::Int(2)],
        }
    }
}

impl Predictor for StressBands {
    fn predict(&self, table: &Table) -> Result<Vec<ClassCode>, ModelError> {
        table
            .records()
            .iter()
            .enumerate()
            .map(|(row, record)| {
                let stress = record
                    .get("DAILY_STRESS")
                    .and_then(|value| value.as_f64())
                    .ok_or_else(|| ModelError::NonNumericFeature {
                        row,
                        column: "DAILY_STRESS".to_string(),
                    })?;
                Ok(ClassCode::Int(match stress {
                    s if s >= 4.0 => 0,
                    s if s >= 2.0 => 1,
                    _ => 2,
                }))
            })
            .collect()
    }

    fn expected_columns(&self) -> Option<&[String]> {
        Some(&self.columns)
    }

    fn classes(&self) -> &[ClassCode] {
        &self.classes
    }
}

fn router() -> axum::Router {
    let predictor = StressBands::new();
    let columns = predictor.columns.clone();
    serving_router(ServingState::new(Arc::new(predictor), columns))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn predict_request(features: Value) -> Request<Body> {
    Request::post("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "features": features }).to_string()))
        .expect("request")
}

#[tokio::test]
async fn root_reports_the_api_is_running() {
    let response = router()
        .oneshot(Request::get("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "message": "Work Life Balance API Running" })
    );
}

#[tokio::test]
async fn columns_hide_the_timestamp() {
    let response = router()
        .oneshot(Request::get("/columns").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(
        json_body(response).await,
        json!({ "columns": ["DAILY_STRESS", "SLEEP_HOURS"] })
    );
}

#[tokio::test]
async fn predict_maps_features_by_position() {
    let response = router()
        .oneshot(predict_request(json!([1, "7.5"])))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "prediction": 2, "label": "Good" })
    );

    let response = router()
        .oneshot(predict_request(json!([5, 6])))
        .await
        .expect("response");
    assert_eq!(
        json_body(response).await,
        json!({ "prediction": 0, "label": "Bad" })
    );
}

#[tokio::test]
async fn predict_rejects_a_short_feature_list() {
    let response = router()
        .oneshot(predict_request(json!([3])))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "expected 2 features, received 1");
}

#[tokio::test]
async fn predict_rejects_non_numeric_stress() {
    let response = router()
        .oneshot(predict_request(json!(["high", 7])))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preflight_from_another_origin_is_allowed() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/predict")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .expect("request");

    let response = router().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&header::HeaderValue::from_static("*"))
    );
}

#[tokio::test]
async fn cross_origin_responses_carry_the_allow_origin_header() {
    let request = Request::get("/columns")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .expect("request");

    let response = router().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&header::HeaderValue::from_static("*"))
    );
}

#[test]
fn loading_a_missing_artifact_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ModelConfig {
        model_path: dir.path().join("model.json"),
        columns_path: None,
    };
    let error = ServingState::load(&config).err().expect("missing artifact");
    assert!(matches!(error, ServingError::Artifact(_)));
}
