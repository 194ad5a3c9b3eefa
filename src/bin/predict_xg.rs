use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};

use xg_terminal::config::AppConfig;
use xg_terminal::logging;
use xg_terminal::{ShotInput, XgPredictor};

fn main() -> Result<ExitCode> {
    logging::init_cli_logging();

    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("usage: predict_xg <shot_input.json>");
        return Ok(ExitCode::from(2));
    };
    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let input: ShotInput =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;

    let cfg = AppConfig::load();
    let predictor = XgPredictor::load(&cfg.artifact_dir)?;
    match predictor.predict_one(&input) {
        Ok(xg) => {
            println!("Predicted XG: {xg:.4}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("error: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}
