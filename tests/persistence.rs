use std::fs;
use std::path::PathBuf;

use xg_terminal::artifact;
use xg_terminal::dataset::{TrainingSet, parse_training_csv};
use xg_terminal::error::ArtifactLoadError;
use xg_terminal::gbm::{BoostingParams, GradientBoostingModel};
use xg_terminal::preprocess::Preprocessor;
use xg_terminal::schema::ShotRecord;

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

fn sample_records(set: &TrainingSet) -> Vec<ShotRecord> {
    let mut out: Vec<ShotRecord> = set.records.iter().take(10).cloned().collect();
    let mut odd = set.records[0].clone();
    odd.numerical = [None, Some(1e-7), Some(-3.25), None, Some(119.999)];
    odd.categorical[1] = "Never Seen".to_string();
    out.push(odd);
    out
}

#[test]
fn round_trip_gives_bit_identical_predictions() {
    let set = fixture_set();
    let preprocessor = Preprocessor::fit(&set.records);
    let x = preprocessor.transform(&set.records);
    let model = GradientBoostingModel::fit(&x, &set.targets, BoostingParams::default()).unwrap();

    let p2: Preprocessor = artifact::decode(&artifact::encode(&preprocessor).unwrap()).unwrap();
    let m2: GradientBoostingModel = artifact::decode(&artifact::encode(&model).unwrap()).unwrap();
    assert_eq!(p2, preprocessor);
    assert_eq!(m2, model);

    let samples = sample_records(&set);
    let before = model.predict(&preprocessor.transform(&samples)).unwrap();
    let after = m2.predict(&p2.transform(&samples)).unwrap();
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn vocabulary_order_survives_the_file() {
    let set = fixture_set();
    let preprocessor = Preprocessor::fit(&set.records);
    let dir = scratch_dir("vocab");
    let path = dir.join("nested").join("preprocessor.json");
    artifact::save(&preprocessor, &path).unwrap();
    assert!(!path.with_extension("json.tmp").exists());

    let loaded: Preprocessor = artifact::load(&path).unwrap();
    assert_eq!(loaded.feature_names(), preprocessor.feature_names());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_is_a_load_error() {
    let dir = scratch_dir("missing");
    let err = artifact::load::<Preprocessor>(&dir.join("preprocessor.json")).unwrap_err();
    assert!(matches!(err, ArtifactLoadError::Missing { .. }));
}

#[test]
fn truncated_file_is_a_load_error() {
    let set = fixture_set();
    let model = GradientBoostingModel::fit(
        &Preprocessor::fit(&set.records).transform(&set.records),
        &set.targets,
        BoostingParams {
            n_estimators: 5,
            ..Default::default()
        },
    )
    .unwrap();
    let dir = scratch_dir("truncated");
    let path = dir.join("model.json");
    artifact::save(&model, &path).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    let err = artifact::load::<GradientBoostingModel>(&path).unwrap_err();
    assert!(matches!(err, ArtifactLoadError::Corrupt { .. }), "{err}");
    let _ = fs::remove_dir_all(&dir);
}
