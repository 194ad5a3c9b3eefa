use std::fs;
use std::path::PathBuf;

use xg_terminal::dataset::{TrainingSet, parse_training_csv};
use xg_terminal::preprocess::{ALL_MISSING_FILL, Preprocessor};
use xg_terminal::schema::{CATEGORICAL_COLUMNS, ShotRecord};

fn fixture_set() -> TrainingSet {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("shots.csv");
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    parse_training_csv(raw.as_bytes()).expect("fixture should parse")
}

fn shot(location_x: Option<f64>, categories: [&str; 6]) -> ShotRecord {
    ShotRecord {
        numerical: [location_x, Some(40.0), Some(118.0), Some(38.0), Some(0.5)],
        categorical: categories.map(str::to_string),
        under_pressure: 0,
    }
}

const SEEN: [&str; 6] = [
    "Regular Play",
    "Striker",
    "Right Foot",
    "Goal",
    "Normal",
    "Open Play",
];

#[test]
fn mean_imputation_happens_before_scaling() {
    let p = Preprocessor::fit(&[
        shot(Some(10.0), SEEN),
        shot(Some(20.0), SEEN),
        shot(None, SEEN),
    ]);
    let stats = &p.numeric_stats()[0];
    assert_eq!(stats.column, "location_x");
    assert!((stats.mean - 15.0).abs() < 1e-12);
    assert!((stats.impute(None) - 15.0).abs() < 1e-12);

    let m = p.transform(&[shot(None, SEEN)]);
    assert!((m.get(0, 0) - 0.5).abs() < 1e-12);
}

#[test]
fn width_is_fixed_regardless_of_values() {
    let set = fixture_set();
    let p = Preprocessor::fit(&set.records);
    let vocab_total: usize = p.vocabularies().iter().map(|v| v.categories.len()).sum();
    assert_eq!(p.output_width(), 5 + vocab_total);

    let extreme = [
        shot(Some(-1e9), SEEN),
        shot(Some(0.0), SEEN),
        shot(Some(1e12), SEEN),
    ];
    let m = p.transform(&extreme);
    assert_eq!(m.rows(), 3);
    assert_eq!(m.cols(), p.output_width());
    assert_eq!(p.transform(&set.records).cols(), p.output_width());
}

#[test]
fn unseen_categories_become_zero_blocks() {
    let set = fixture_set();
    let p = Preprocessor::fit(&set.records);
    let unseen = shot(
        Some(100.0),
        ["Kick Off", "Sweeper", "Knee", "Own Goal", "Backheel", "Throw"],
    );
    let (m, report) = p.transform_with_report(std::slice::from_ref(&unseen));
    assert_eq!(report.unseen_categories, CATEGORICAL_COLUMNS.len());
    assert!(m.row(0)[5..].iter().all(|v| *v == 0.0));
}

#[test]
fn seen_categories_set_exactly_one_bit_per_column() {
    let set = fixture_set();
    let p = Preprocessor::fit(&set.records);
    let m = p.transform(&set.records[..1]);
    let ones = m.row(0)[5..].iter().filter(|v| **v == 1.0).count();
    assert_eq!(ones, CATEGORICAL_COLUMNS.len());
}

#[test]
fn all_missing_column_uses_fixed_fill() {
    let mut records = vec![shot(Some(1.0), SEEN), shot(Some(2.0), SEEN)];
    for r in &mut records {
        r.numerical[4] = None;
    }
    let p = Preprocessor::fit(&records);
    let stats = &p.numeric_stats()[4];
    assert_eq!(stats.mean, ALL_MISSING_FILL);
    assert_eq!(stats.min, ALL_MISSING_FILL);
    assert_eq!(stats.max, ALL_MISSING_FILL);

    let m = p.transform(&records);
    assert_eq!(m.get(0, 4), 0.0);
    assert_eq!(m.get(1, 4), 0.0);
    assert!(p.validate().is_ok());
}

#[test]
fn empty_vocabulary_is_zero_width() {
    let p = Preprocessor::fit(&[]);
    assert!(p.vocabularies().iter().all(|v| v.categories.is_empty()));
    assert_eq!(p.output_width(), 5);
    let m = p.transform(&[shot(Some(3.0), SEEN)]);
    assert_eq!(m.cols(), 5);
}

#[test]
fn under_pressure_does_not_change_features() {
    let set = fixture_set();
    let p = Preprocessor::fit(&set.records);
    let mut a = shot(Some(100.0), SEEN);
    let b = a.clone();
    a.under_pressure = 1;
    assert_eq!(p.transform(&[a]), p.transform(&[b]));
}
