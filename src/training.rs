use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::artifact;
use crate::config::AppConfig;
use crate::dataset::{self, TrainingSet};
use crate::evaluation::{RegressionMetrics, holdout_split, regression_metrics};
use crate::gbm::{BoostingParams, GradientBoostingModel};
use crate::predictor::XgPredictor;
use crate::preprocess::Preprocessor;

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub rows: usize,
    pub skipped_rows: usize,
    pub features: usize,
    pub holdout: Option<RegressionMetrics>,
    pub train: RegressionMetrics,
    pub top_features: Vec<(String, f64)>,
}

/// Fits the preprocessor, then the model on its output.
pub fn fit_pipeline(set: &TrainingSet, params: BoostingParams) -> Result<XgPredictor> {
    if set.is_empty() {
        return Err(anyhow!("no training rows"));
    }
    let preprocessor = Preprocessor::fit(&set.records);
    let x = preprocessor.transform(&set.records);
    let model = GradientBoostingModel::fit(&x, &set.targets, params).context("fit model")?;
    XgPredictor::new(preprocessor, model).context("assemble predictor")
}

pub fn evaluate(predictor: &XgPredictor, set: &TrainingSet) -> Result<RegressionMetrics> {
    let x = predictor.preprocessor().transform(&set.records);
    let predicted = predictor.model().predict(&x)?;
    Ok(regression_metrics(&set.targets, &predicted))
}

/// Loads the dataset, reports holdout metrics, refits on every row and writes
/// both artifacts.
pub fn run_training(cfg: &AppConfig) -> Result<TrainingReport> {
    let set = dataset::load_training_csv(&cfg.dataset_path)
        .with_context(|| format!("load {}", cfg.dataset_path.display()))?;
    if set.is_empty() {
        return Err(anyhow!(
            "{} has no usable rows",
            cfg.dataset_path.display()
        ));
    }

    let holdout = if cfg.holdout_fraction > 0.0 {
        let (train_idx, test_idx) = holdout_split(set.len(), cfg.holdout_fraction, cfg.seed);
        if test_idx.is_empty() {
            warn!(rows = set.len(), "too few rows for a holdout split");
            None
        } else {
            let (train, test) = set.partition(&train_idx);
            let predictor = fit_pipeline(&train, cfg.params)?;
            let metrics = evaluate(&predictor, &test)?;
            info!(
                samples = metrics.samples,
                rmse = metrics.rmse,
                mae = metrics.mae,
                r2 = metrics.r2,
                "holdout metrics"
            );
            Some(metrics)
        }
    } else {
        None
    };

    let predictor = fit_pipeline(&set, cfg.params)?;
    let train = evaluate(&predictor, &set)?;
    info!(rmse = train.rmse, r2 = train.r2, "training metrics");

    artifact::save(predictor.preprocessor(), &cfg.preprocessor_path())?;
    artifact::save(predictor.model(), &cfg.model_path())?;

    Ok(TrainingReport {
        rows: set.len(),
        skipped_rows: set.skipped_rows,
        features: predictor.model().n_features(),
        holdout,
        train,
        top_features: top_features(&predictor, 10),
    })
}

pub fn top_features(predictor: &XgPredictor, limit: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = predictor
        .preprocessor()
        .feature_names()
        .into_iter()
        .zip(predictor.model().feature_importances())
        .filter(|(_, w)| *w > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}
