use std::path::Path;

use tracing::{debug, info};

use crate::artifact;
use crate::config::{MODEL_FILE, PREPROCESSOR_FILE};
use crate::error::{ArtifactLoadError, PredictError};
use crate::gbm::GradientBoostingModel;
use crate::preprocess::Preprocessor;
use crate::schema::{BINARY_COLUMN, ShotInput, ShotRecord};

/// Loaded preprocessor + model. Immutable after construction.
#[derive(Debug, Clone)]
pub struct XgPredictor {
    preprocessor: Preprocessor,
    model: GradientBoostingModel,
}

impl XgPredictor {
    pub fn new(
        preprocessor: Preprocessor,
        model: GradientBoostingModel,
    ) -> Result<Self, ArtifactLoadError> {
        let width = preprocessor.output_width();
        if width != model.n_features() {
            return Err(ArtifactLoadError::Mismatch(format!(
                "preprocessor produces {width} features, model was trained on {}",
                model.n_features()
            )));
        }
        Ok(Self {
            preprocessor,
            model,
        })
    }

    pub fn load(artifact_dir: &Path) -> Result<Self, ArtifactLoadError> {
        Self::load_from(
            &artifact_dir.join(PREPROCESSOR_FILE),
            &artifact_dir.join(MODEL_FILE),
        )
    }

    pub fn load_from(preprocessor_path: &Path, model_path: &Path) -> Result<Self, ArtifactLoadError> {
        let preprocessor: Preprocessor = artifact::load(preprocessor_path)?;
        let model: GradientBoostingModel = artifact::load(model_path)?;
        let predictor = Self::new(preprocessor, model)?;
        info!(
            features = predictor.model.n_features(),
            trees = predictor.model.trees().len(),
            "xg predictor loaded"
        );
        Ok(predictor)
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn model(&self) -> &GradientBoostingModel {
        &self.model
    }

    /// Validates one raw record and returns its predicted xG (unclamped).
    pub fn predict_one(&self, input: &ShotInput) -> Result<f64, PredictError> {
        let record = validate_input(input)?;
        self.predict_record(&record)
    }

    pub fn predict_record(&self, record: &ShotRecord) -> Result<f64, PredictError> {
        let (features, report) = self
            .preprocessor
            .transform_with_report(std::slice::from_ref(record));
        if report.unseen_categories > 0 {
            debug!(unseen = report.unseen_categories, "prediction used zero-vector fallback");
        }
        let predictions = self
            .model
            .predict(&features)
            .map_err(|e| PredictError::Prediction(e.to_string()))?;
        let Some(&value) = predictions.first() else {
            return Err(PredictError::Prediction("model returned no rows".to_string()));
        };
        if !value.is_finite() {
            return Err(PredictError::Prediction(format!("non-finite prediction {value}")));
        }
        Ok(value)
    }
}

/// Boundary validation: every numerical field must parse as a finite float.
/// The first failing field, in schema order, is reported.
pub fn validate_input(input: &ShotInput) -> Result<ShotRecord, PredictError> {
    let mut record = ShotRecord::default();
    for (slot, (field, raw)) in record.numerical.iter_mut().zip(input.numerical_fields()) {
        let value = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| PredictError::InvalidInput {
                field,
                value: raw.to_string(),
            })?;
        *slot = Some(value);
    }
    if input.under_pressure > 1 {
        return Err(PredictError::InvalidFlag {
            field: BINARY_COLUMN,
            value: input.under_pressure,
        });
    }
    for (slot, value) in record.categorical.iter_mut().zip(input.categorical_fields()) {
        *slot = value.to_string();
    }
    record.under_pressure = input.under_pressure;
    Ok(record)
}
