use super::boosted::GradientBoosted;
use super::forest::RandomForest;
use super::pipeline::TrainedPipeline;
use super::preprocess::Preprocessor;
use super::{ClassCode, Predictor};
use crate::training::EvaluationReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const FORMAT_VERSION: u32 = 1;

/// Ensemble payload; the `kind` tag selects the predictor variant at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnsembleSpec {
    RandomForest(RandomForest),
    GradientBoosted(GradientBoosted),
}

impl EnsembleSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RandomForest(_) => "random_forest",
            Self::GradientBoosted(_) => "gradient_boosted",
        }
    }

    fn n_features(&self) -> usize {
        match self {
            Self::RandomForest(forest) => forest.n_features,
            Self::GradientBoosted(boosted) => boosted.n_features,
        }
    }
}

/// Persisted model: schema, encoding statistics, class list, and ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub feature_columns: Option<Vec<String>>,
    #[serde(default)]
    pub preprocessor: Option<Preprocessor>,
    pub classes: Vec<ClassCode>,
    pub model: EnsembleSpec,
    #[serde(default)]
    pub evaluation: Option<EvaluationReport>,
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("model not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to access model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("model artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported artifact format version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

impl ModelArtifact {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => ArtifactError::NotFound(path.to_path_buf()),
            _ => ArtifactError::Io(err),
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_reader(reader)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.to_writer(std::io::BufWriter::new(file))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), ArtifactError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Columns a record must be aligned to before prediction.
    ///
    /// The preprocessor's input columns win over `feature_columns`.
    pub fn expected_columns(&self) -> Option<Vec<String>> {
        self.preprocessor
            .as_ref()
            .map(Preprocessor::column_names)
            .or_else(|| self.feature_columns.clone())
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion(self.format_version));
        }
        if self.classes.len() < 2 {
            return Err(ArtifactError::Invalid(
                "at least two classes are required".to_string(),
            ));
        }

        let width = self.model.n_features();
        if let Some(preprocessor) = &self.preprocessor {
            if preprocessor.width() != width {
                return Err(ArtifactError::Invalid(format!(
                    "preprocessor emits {} features but the model expects {width}",
                    preprocessor.width()
                )));
            }
        } else if let Some(columns) = &self.feature_columns {
            if columns.len() != width {
                return Err(ArtifactError::Invalid(format!(
                    "{} feature columns listed but the model expects {width}",
                    columns.len()
                )));
            }
        }

        match &self.model {
            EnsembleSpec::RandomForest(forest) => forest.validate(self.classes.len()),
            EnsembleSpec::GradientBoosted(boosted) => boosted.validate(self.classes.len()),
        }
        .map_err(ArtifactError::Invalid)
    }

    /// Builds the predictor variant named by the artifact's `kind`.
    pub fn into_predictor(self) -> Box<dyn Predictor> {
        let expected_columns = self.expected_columns();
        let Self {
            preprocessor,
            classes,
            model,
            ..
        } = self;

        match model {
            EnsembleSpec::RandomForest(model) => Box::new(TrainedPipeline {
                expected_columns,
                preprocessor,
                classes,
                model,
            }),
            EnsembleSpec::GradientBoosted(model) => Box::new(TrainedPipeline {
                expected_columns,
                preprocessor,
                classes,
                model,
            }),
        }
    }
}

/// Loads an artifact from disk and returns its predictor.
pub fn load_predictor<P: AsRef<Path>>(path: P) -> Result<Box<dyn Predictor>, ArtifactError> {
    let artifact = ModelArtifact::from_path(&path)?;
    debug!(
        path = %path.as_ref().display(),
        kind = artifact.model.kind(),
        classes = artifact.classes.len(),
        "model artifact loaded"
    );
    Ok(artifact.into_predictor())
}
