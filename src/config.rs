use std::env;
use std::path::PathBuf;

use crate::gbm::BoostingParams;

pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const MODEL_FILE: &str = "gradient_boosting_model.json";

const DEFAULT_DATASET: &str = "football_datawc2019v2.csv";
const DEFAULT_ASSET_DIR: &str = "assets";
const DEFAULT_HOLDOUT_FRACTION: f64 = 0.2;
const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub dataset_path: PathBuf,
    pub artifact_dir: PathBuf,
    pub asset_dir: PathBuf,
    pub params: BoostingParams,
    pub holdout_fraction: f64,
    pub seed: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            artifact_dir: PathBuf::from("."),
            asset_dir: PathBuf::from(DEFAULT_ASSET_DIR),
            params: BoostingParams::default(),
            holdout_fraction: DEFAULT_HOLDOUT_FRACTION,
            seed: DEFAULT_SEED,
        }
    }
}

impl AppConfig {
    /// Reads `.env.local` / `.env` if present, then the `XG_*` variables.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let path = |key: &str, fallback: PathBuf| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(fallback)
        };

        let mut params = d.params;
        params.n_estimators = parsed(&lookup, "XG_N_ESTIMATORS").unwrap_or(params.n_estimators);
        params.max_depth = parsed(&lookup, "XG_MAX_DEPTH").unwrap_or(params.max_depth);
        params.learning_rate = parsed::<f64, _>(&lookup, "XG_LEARNING_RATE")
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(params.learning_rate);

        Self {
            dataset_path: path("XG_DATASET_PATH", d.dataset_path),
            artifact_dir: path("XG_ARTIFACT_DIR", d.artifact_dir),
            asset_dir: path("XG_ASSET_DIR", d.asset_dir),
            params,
            holdout_fraction: parsed::<f64, _>(&lookup, "XG_HOLDOUT_FRACTION")
                .filter(|v| (0.0..1.0).contains(v))
                .unwrap_or(d.holdout_fraction),
            seed: parsed(&lookup, "XG_SEED").unwrap_or(d.seed),
        }
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        self.artifact_dir.join(PREPROCESSOR_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifact_dir.join(MODEL_FILE)
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse::<T>().ok())
}

/// Per-user cache directory, used for the dashboard log file.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join("xg_terminal"));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join("xg_terminal"))
}
