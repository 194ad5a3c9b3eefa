pub mod artifact;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod gbm;
pub mod logging;
pub mod matrix;
pub mod predictor;
pub mod preprocess;
pub mod schema;
pub mod training;

pub use error::{ArtifactLoadError, PredictError};
pub use predictor::XgPredictor;
pub use schema::{ShotInput, ShotRecord};
