use super::preprocess::Preprocessor;
use super::{ClassCode, ModelError, Predictor};
use crate::table::{Table, Value};

/// Tree ensemble operating on already-encoded feature rows.
pub(crate) trait Ensemble: Send + Sync {
    fn n_features(&self) -> usize;
    fn probabilities(&self, row: &[f64]) -> Result<Vec<f64>, ModelError>;
    fn predict_index(&self, row: &[f64]) -> Result<usize, ModelError>;
}

/// Encoding step plus ensemble, exposed through [`Predictor`].
pub(crate) struct TrainedPipeline<M> {
    pub(crate) expected_columns: Option<Vec<String>>,
    pub(crate) preprocessor: Option<Preprocessor>,
    pub(crate) classes: Vec<ClassCode>,
    pub(crate) model: M,
}

impl<M: Ensemble> TrainedPipeline<M> {
    fn feature_rows(&self, table: &Table) -> Result<Vec<Vec<f64>>, ModelError> {
        if let Some(preprocessor) = &self.preprocessor {
            return Ok(table
                .records()
                .iter()
                .map(|record| preprocessor.transform(record))
                .collect());
        }

        let columns = self.expected_columns.as_deref().unwrap_or(table.columns());
        if columns.len() != self.model.n_features() {
            return Err(ModelError::FeatureCount {
                expected: self.model.n_features(),
                found: columns.len(),
            });
        }

        table
            .records()
            .iter()
            .enumerate()
            .map(|(row, record)| {
                columns
                    .iter()
                    .map(|column| match record.get(column) {
                        None | Some(Value::Missing) => Err(ModelError::MissingFeature {
                            row,
                            column: column.clone(),
                        }),
                        Some(value) => value.as_f64().ok_or_else(|| {
                            ModelError::NonNumericFeature {
                                row,
                                column: column.clone(),
                            }
                        }),
                    })
                    .collect::<Result<Vec<f64>, ModelError>>()
            })
            .collect()
    }

    fn class_at(&self, index: usize) -> ClassCode {
        self.classes
            .get(index)
            .cloned()
            .unwrap_or(ClassCode::Int(index as i64))
    }
}

impl<M: Ensemble> Predictor for TrainedPipeline<M> {
    fn predict(&self, table: &Table) -> Result<Vec<ClassCode>, ModelError> {
        self.feature_rows(table)?
            .iter()
            .map(|row| self.model.predict_index(row).map(|index| self.class_at(index)))
            .collect()
    }

    fn predict_proba(&self, table: &Table) -> Result<Vec<Vec<f64>>, ModelError> {
        self.feature_rows(table)?
            .iter()
            .map(|row| self.model.probabilities(row))
            .collect()
    }

    fn expected_columns(&self) -> Option<&[String]> {
        self.expected_columns.as_deref()
    }

    fn classes(&self) -> &[ClassCode] {
        &self.classes
    }
}
