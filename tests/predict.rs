use std::fs;
use std::path::PathBuf;

use xg_terminal::artifact;
use xg_terminal::dataset::{TrainingSet, parse_training_csv};
use xg_terminal::error::{ArtifactLoadError, PredictError};
use xg_terminal::gbm::{BoostingParams, GradientBoostingModel};
use xg_terminal::matrix::FeatureMatrix;
use xg_terminal::preprocess::Preprocessor;
use xg_terminal::training::fit_pipeline;
use xg_terminal::{ShotInput, XgPredictor};

fn fixture_set() -> TrainingSet {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("shots.csv");
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    parse_training_csv(raw.as_bytes()).expect("fixture should parse")
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("xg_terminal_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn valid_input() -> ShotInput {
    ShotInput {
        location_x: "108.5".into(),
        location_y: "38.2".into(),
        end_loc_x: "120.0".into(),
        end_loc_y: "39.5".into(),
        end_loc_z: "0.8".into(),
        play_pattern: "Regular Play".into(),
        position: "Striker".into(),
        shot_body_part: "Right Foot".into(),
        shot_outcome: "Goal".into(),
        shot_technique: "Normal".into(),
        shot_type: "Open Play".into(),
        under_pressure: 1,
    }
}

fn predictor() -> XgPredictor {
    fit_pipeline(&fixture_set(), BoostingParams::default()).expect("pipeline fits")
}

#[test]
fn seen_goal_outcome_returns_a_float() {
    let p = predictor();
    let xg = p.predict_one(&valid_input()).expect("prediction succeeds");
    assert!(xg.is_finite());
}

#[test]
fn unparsable_location_names_the_field() {
    let p = predictor();
    let mut input = valid_input();
    input.location_x = "abc".into();
    let err = p.predict_one(&input).unwrap_err();
    assert_eq!(
        err,
        PredictError::InvalidInput {
            field: "location_x",
            value: "abc".to_string(),
        }
    );
    assert!(err.to_string().contains("location_x"));
}

#[test]
fn repeated_calls_are_identical() {
    let p = predictor();
    let input = valid_input();
    let a = p.predict_one(&input).unwrap();
    let b = p.predict_one(&input).unwrap();
    assert_eq!(a.to_bits(), b.to_bits());
}

#[test]
fn unseen_category_still_predicts() {
    let p = predictor();
    let mut input = valid_input();
    input.position = "Sweeper Keeper".into();
    input.shot_technique = "Rabona".into();
    assert!(p.predict_one(&input).unwrap().is_finite());
}

#[test]
fn predict_one_matches_the_batch_path() {
    let p = predictor();
    let record = xg_terminal::predictor::validate_input(&valid_input()).unwrap();
    let batch = p
        .model()
        .predict(&p.preprocessor().transform(&[record]))
        .unwrap();
    assert_eq!(p.predict_one(&valid_input()).unwrap(), batch[0]);
}

#[test]
fn mismatched_artifacts_are_rejected() {
    let set = fixture_set();
    let preprocessor = Preprocessor::fit(&set.records);
    let x = FeatureMatrix::zeros(2, preprocessor.output_width() + 1);
    let model = GradientBoostingModel::fit(&x, &[0.1, 0.2], BoostingParams::default()).unwrap();
    let err = XgPredictor::new(preprocessor, model).unwrap_err();
    assert!(matches!(err, ArtifactLoadError::Mismatch(_)));
}

#[test]
fn loads_from_an_artifact_directory() {
    let p = predictor();
    let dir = scratch_dir("predictor");
    artifact::save(p.preprocessor(), &dir.join("preprocessor.json")).unwrap();
    artifact::save(p.model(), &dir.join("gradient_boosting_model.json")).unwrap();

    let loaded = XgPredictor::load(&dir).expect("artifacts load");
    let input = valid_input();
    assert_eq!(
        loaded.predict_one(&input).unwrap().to_bits(),
        p.predict_one(&input).unwrap().to_bits()
    );
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_model_fails_initialization() {
    let p = predictor();
    let dir = scratch_dir("half");
    artifact::save(p.preprocessor(), &dir.join("preprocessor.json")).unwrap();
    let err = XgPredictor::load(&dir).unwrap_err();
    assert!(matches!(err, ArtifactLoadError::Missing { .. }));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn input_deserializes_from_json_fixture() {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures/shot_input.json");
    let raw = fs::read_to_string(path).unwrap();
    let input: ShotInput = serde_json::from_str(&raw).unwrap();
    assert_eq!(input.shot_outcome, "Goal");
    assert!(predictor().predict_one(&input).is_ok());
}

#[test]
fn overflowing_ensemble_is_a_prediction_error() {
    let preprocessor = Preprocessor::fit(&fixture_set().records);
    // Each leaf is finite, so the model is structurally valid, but their sum is not.
    let model: GradientBoostingModel = serde_json::from_value(serde_json::json!({
        "params": {
            "n_estimators": 2,
            "learning_rate": 1.0,
            "max_depth": 3,
            "min_samples_split": 2,
            "min_samples_leaf": 1
        },
        "n_features": preprocessor.output_width(),
        "init": 0.0,
        "trees": [
            { "nodes": [{ "type": "leaf", "value": 1.0e308 }] },
            { "nodes": [{ "type": "leaf", "value": 1.0e308 }] }
        ],
        "train_loss": [0.0, 0.0]
    }))
    .expect("model json");
    assert!(model.validate().is_ok());

    let p = XgPredictor::new(preprocessor, model).expect("widths match");
    let err = p.predict_one(&valid_input()).unwrap_err();
    match &err {
        PredictError::Prediction(cause) => assert!(cause.contains("non-finite"), "{cause}"),
        other => panic!("expected a prediction error, got {other:?}"),
    }
    assert_eq!(err.field(), None);
    assert!(err.to_string().starts_with("prediction failed:"));
}

#[test]
fn non_binary_pressure_flag_is_rejected_before_prediction() {
    let p = predictor();
    let mut input = valid_input();
    input.under_pressure = 2;
    let err = p.predict_one(&input).unwrap_err();
    assert_eq!(
        err,
        PredictError::InvalidFlag {
            field: "under_pressure",
            value: 2,
        }
    );
    assert!(!err.to_string().contains("number"));
}

#[test]
fn huge_targets_either_fail_to_fit_or_round_trip() {
    let x = FeatureMatrix::zeros(2, 1);
    let err = GradientBoostingModel::fit(&x, &[1.7e308, -1.7e308], BoostingParams::default());
    assert!(err.is_err());

    let model = GradientBoostingModel::fit(&x, &[1.7e308, 1.7e308], BoostingParams::default())
        .expect("finite targets with a finite mean fit");
    let dir = scratch_dir("huge_targets");
    let path = dir.join("gradient_boosting_model.json");
    artifact::save(&model, &path).unwrap();
    let loaded: GradientBoostingModel = artifact::load(&path).expect("saved model loads");
    assert_eq!(loaded, model);
    let _ = fs::remove_dir_all(&dir);
}
