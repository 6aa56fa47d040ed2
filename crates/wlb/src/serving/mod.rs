//! HTTP prediction endpoints for the wellbeing model.
//!
//! `POST /predict` takes an ordered `features` list that maps positionally
//! onto the column list served by `GET /columns`, and answers with the
//! three-way wellbeing class. Attrition labels belong to the batch tool and
//! are never produced here.

use crate::config::ModelConfig;
use crate::model::{load_predictor, ArtifactError, ClassCode, ModelError, Predictor};
use crate::scoring::{align_table, WellbeingClass};
use crate::table::{Record, Table, Value};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

/// Column hidden from clients; the questionnaire never collects it.
pub const HIDDEN_COLUMN: &str = "Timestamp";

#[derive(Clone)]
pub struct ServingState {
    predictor: Arc<dyn Predictor>,
    columns: Arc<Vec<String>>,
}

impl ServingState {
    pub fn new(predictor: Arc<dyn Predictor>, columns: Vec<String>) -> Self {
        let columns = columns
            .into_iter()
            .filter(|column| column != HIDDEN_COLUMN)
            .collect();
        Self {
            predictor,
            columns: Arc::new(columns),
        }
    }

    /// Loads the artifact, then takes columns from the configured list or,
    /// failing that, from the artifact's own schema.
    pub fn load(config: &ModelConfig) -> Result<Self, ServingError> {
        let predictor: Arc<dyn Predictor> = Arc::from(load_predictor(&config.model_path)?);
        let columns = match &config.columns_path {
            Some(path) => read_columns(path)?,
            None => predictor
                .expected_columns()
                .map(<[String]>::to_vec)
                .ok_or(ServingError::NoSchema)?,
        };
        Ok(Self::new(predictor, columns))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

fn read_columns(path: &Path) -> Result<Vec<String>, ServingError> {
    let file = std::fs::File::open(path).map_err(|source| ServingError::ColumnsIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| {
        ServingError::ColumnsJson {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ServingError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("failed to read column list {}: {source}", path.display())]
    ColumnsIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("column list {} is not a JSON array of names: {source}", path.display())]
    ColumnsJson {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("model artifact records no input columns; provide a column list")]
    NoSchema,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("expected {expected} features, received {found}")]
    FeatureLength { expected: usize, found: usize },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("model returned no prediction")]
    Empty,
    #[error("model returned unrecognized class '{0}'")]
    UnknownClass(ClassCode),
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = match &self {
            PredictError::FeatureLength { .. }
            | PredictError::Model(ModelError::MissingFeature { .. })
            | PredictError::Model(ModelError::NonNumericFeature { .. }) => StatusCode::BAD_REQUEST,
            PredictError::Model(_) | PredictError::Empty | PredictError::UnknownClass(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: i64,
    pub label: String,
}

/// Prediction routes, open to any origin so a browser questionnaire served
/// elsewhere can call them.
pub fn serving_router(state: ServingState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home_handler))
        .route("/columns", get(columns_handler))
        .route("/predict", post(predict_handler))
        .with_state(state)
        .layer(cors)
}

pub(crate) async fn home_handler() -> Json<serde_json::Value> {
    Json(json!({ "message": "Work Life Balance API Running" }))
}

pub(crate) async fn columns_handler(State(state): State<ServingState>) -> Json<serde_json::Value> {
    Json(json!({ "columns": state.columns() }))
}

pub(crate) async fn predict_handler(
    State(state): State<ServingState>,
    Json(request): Json<PredictRequest>,
) -> Response {
    match predict(&state, &request) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            warn!(error = %err, "prediction request failed");
            err.into_response()
        }
    }
}

/// Maps `request.features` onto the served columns and classifies the record.
pub fn predict(
    state: &ServingState,
    request: &PredictRequest,
) -> Result<PredictResponse, PredictError> {
    let columns = state.columns();
    if request.features.len() != columns.len() {
        return Err(PredictError::FeatureLength {
            expected: columns.len(),
            found: request.features.len(),
        });
    }

    let record: Record = columns
        .iter()
        .zip(&request.features)
        .map(|(column, value)| (column.clone(), Value::from_json(value)))
        .collect();
    let mut table = Table::new(columns.to_vec());
    table.push(record);
    let aligned = align_table(&table, state.predictor.expected_columns());

    let class = state
        .predictor
        .predict(&aligned)?
        .into_iter()
        .next()
        .ok_or(PredictError::Empty)?
        .coerced();
    debug!(%class, "prediction served");

    let wellbeing = class
        .as_int()
        .and_then(WellbeingClass::from_code)
        .ok_or_else(|| PredictError::UnknownClass(class.clone()))?;

    Ok(PredictResponse {
        prediction: wellbeing.code(),
        label: wellbeing.label().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(ClassCode);

    impl Predictor for Constant {
        fn predict(&self, table: &Table) -> Result<Vec<ClassCode>, ModelError> {
            Ok(vec![self.0.clone(); table.len()])
        }

        fn classes(&self) -> &[ClassCode] {
            std::slice::from_ref(&self.0)
        }
    }

    fn state(class: ClassCode) -> ServingState {
        ServingState::new(
            Arc::new(Constant(class)),
            vec![
                "Timestamp".to_string(),
                "DAILY_STRESS".to_string(),
                "SLEEP_HOURS".to_string(),
            ],
        )
    }

    #[test]
    fn timestamp_is_never_served() {
        assert_eq!(state(ClassCode::Int(0)).columns(), ["DAILY_STRESS", "SLEEP_HOURS"]);
    }

    #[test]
    fn predict_labels_wellbeing_classes() {
        let request = PredictRequest {
            features: vec![json!(3), json!("7")],
        };
        let response = predict(&state(ClassCode::Int(2)), &request).expect("predict");
        assert_eq!(
            response,
            PredictResponse {
                prediction: 2,
                label: "Good".to_string()
            }
        );
    }

    #[test]
    fn feature_count_must_match_columns() {
        let request = PredictRequest {
            features: vec![json!(3)],
        };
        let error = predict(&state(ClassCode::Int(0)), &request).expect_err("short request");
        assert!(matches!(
            error,
            PredictError::FeatureLength {
                expected: 2,
                found: 1
            }
        ));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_class_is_a_server_error() {
        let request = PredictRequest {
            features: vec![json!(3), json!(7)],
        };
        let error = predict(&state(ClassCode::Int(5)), &request).expect_err("class 5");
        assert!(matches!(error, PredictError::UnknownClass(ClassCode::Int(5))));
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn home_handler_reports_running() {
        let Json(body) = home_handler().await;
        assert_eq!(body["message"], "Work Life Balance API Running");
    }
}
