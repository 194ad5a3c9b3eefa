use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::error::DatasetError;
use crate::schema::{
    BINARY_COLUMN, CATEGORICAL_COLUMNS, NUMERICAL_COLUMNS, ShotRecord, TARGET_COLUMN,
    parse_under_pressure,
};

#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub records: Vec<ShotRecord>,
    pub targets: Vec<f64>,
    pub skipped_rows: usize,
    pub unparsable_cells: usize,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Splits rows by index into (selected, rest). Indices out of range are ignored.
    pub fn partition(&self, selected: &[usize]) -> (TrainingSet, TrainingSet) {
        let mut mask = vec![false; self.records.len()];
        for &idx in selected {
            if let Some(slot) = mask.get_mut(idx) {
                *slot = true;
            }
        }
        let mut left = TrainingSet::default();
        let mut right = TrainingSet::default();
        for (idx, picked) in mask.into_iter().enumerate() {
            let out = if picked { &mut left } else { &mut right };
            out.records.push(self.records[idx].clone());
            out.targets.push(self.targets[idx]);
        }
        (left, right)
    }
}

struct ColumnIndex {
    numerical: [usize; 5],
    categorical: [usize; 6],
    binary: Option<usize>,
    target: usize,
}

pub fn load_training_csv(path: &Path) -> Result<TrainingSet, DatasetError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let set = read_rows(reader, path)?;
    info!(
        path = %path.display(),
        rows = set.len(),
        skipped = set.skipped_rows,
        "loaded training data"
    );
    Ok(set)
}

pub fn parse_training_csv<R: Read>(input: R) -> Result<TrainingSet, DatasetError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    read_rows(reader, Path::new("<memory>"))
}

fn read_rows<R: Read>(mut reader: csv::Reader<R>, path: &Path) -> Result<TrainingSet, DatasetError> {
    let headers = reader
        .headers()
        .map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let columns = resolve_columns(&headers)?;

    let mut set = TrainingSet::default();
    for (row_idx, row) in reader.records().enumerate() {
        // Header is line 1.
        let line = row_idx + 2;
        let row = row.map_err(|source| DatasetError::Row { row: line, source })?;

        let Some(target) = row.get(columns.target).and_then(parse_optional_f64) else {
            set.skipped_rows += 1;
            warn!(line, "skipping row without a usable {TARGET_COLUMN}");
            continue;
        };

        let mut record = ShotRecord::default();
        for (slot, &col) in record.numerical.iter_mut().zip(&columns.numerical) {
            let raw = row.get(col).unwrap_or("");
            *slot = parse_optional_f64(raw);
            if slot.is_none() && !is_missing_marker(raw) {
                set.unparsable_cells += 1;
            }
        }
        for (slot, &col) in record.categorical.iter_mut().zip(&columns.categorical) {
            *slot = row.get(col).unwrap_or("").trim().to_string();
        }
        record.under_pressure = match columns.binary.and_then(|col| row.get(col)) {
            Some(raw) => parse_under_pressure(raw).unwrap_or_else(|| {
                set.unparsable_cells += 1;
                0
            }),
            None => 0,
        };

        set.records.push(record);
        set.targets.push(target);
    }

    if set.unparsable_cells > 0 {
        warn!(
            cells = set.unparsable_cells,
            "unparsable cells treated as missing"
        );
    }
    Ok(set)
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<ColumnIndex, DatasetError> {
    let find = |name: &'static str| headers.iter().position(|h| h.trim() == name);
    let require = |name: &'static str| find(name).ok_or(DatasetError::MissingColumn(name));

    let mut numerical = [0usize; 5];
    for (slot, name) in numerical.iter_mut().zip(NUMERICAL_COLUMNS) {
        *slot = require(name)?;
    }
    let mut categorical = [0usize; 6];
    for (slot, name) in categorical.iter_mut().zip(CATEGORICAL_COLUMNS) {
        *slot = require(name)?;
    }

    Ok(ColumnIndex {
        numerical,
        categorical,
        binary: find(BINARY_COLUMN),
        target: require(TARGET_COLUMN)?,
    })
}

fn is_missing_marker(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("na")
}

fn parse_optional_f64(raw: &str) -> Option<f64> {
    if is_missing_marker(raw) {
        return None;
    }
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
