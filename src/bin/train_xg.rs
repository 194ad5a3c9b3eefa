use anyhow::Result;

use xg_terminal::config::AppConfig;
use xg_terminal::logging;
use xg_terminal::training;

fn main() -> Result<()> {
    logging::init_cli_logging();
    let cfg = AppConfig::load();

    let report = training::run_training(&cfg)?;

    println!(
        "trained on {} rows ({} skipped), {} features",
        report.rows, report.skipped_rows, report.features
    );
    if let Some(h) = report.holdout {
        println!(
            "holdout ({} rows): rmse {:.4}  mae {:.4}  r2 {:.3}",
            h.samples, h.rmse, h.mae, h.r2
        );
    }
    println!(
        "train: rmse {:.4}  mae {:.4}  r2 {:.3}",
        report.train.rmse, report.train.mae, report.train.r2
    );
    for (name, weight) in &report.top_features {
        println!("  {:<40} {:.3}", name, weight);
    }
    println!("Model and preprocessor saved to {}", cfg.artifact_dir.display());
    Ok(())
}
