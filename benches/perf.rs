use std::fs;
use std::path::PathBuf;

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use xg_terminal::ShotInput;
use xg_terminal::dataset::{TrainingSet, parse_training_csv};
use xg_terminal::gbm::{BoostingParams, GradientBoostingModel};
use xg_terminal::preprocess::Preprocessor;
use xg_terminal::training::fit_pipeline;

fn fixture_set() -> TrainingSet {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/shots.csv");
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    parse_training_csv(raw.as_bytes()).expect("fixture should parse")
}

fn sample_input() -> ShotInput {
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
        under_pressure: 0,
    }
}

fn bench_transform(c: &mut Criterion) {
    let set = fixture_set();
    let preprocessor = Preprocessor::fit(&set.records);
    c.bench_function("transform_fixture", |b| {
        b.iter(|| {
            let m = preprocessor.transform(black_box(&set.records));
            black_box(m.cols());
        })
    });
}

fn bench_predict_one(c: &mut Criterion) {
    let predictor = fit_pipeline(&fixture_set(), BoostingParams::default()).unwrap();
    let input = sample_input();
    c.bench_function("predict_one", |b| {
        b.iter(|| black_box(predictor.predict_one(black_box(&input)).unwrap()))
    });
}

fn bench_fit(c: &mut Criterion) {
    let set = fixture_set();
    let x = Preprocessor::fit(&set.records).transform(&set.records);
    c.bench_function("fit_100_trees", |b| {
        b.iter(|| {
            let model =
                GradientBoostingModel::fit(black_box(&x), &set.targets, BoostingParams::default())
                    .unwrap();
            black_box(model.init());
        })
    });
}

criterion_group!(benches, bench_transform, bench_predict_one, bench_fit);
criterion_main!(benches);
