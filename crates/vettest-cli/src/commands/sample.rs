//! The `vettest sample` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use vettest_core::parser::parse_bank;
use vettest_core::sampling::sample_catalog;
use vettest_store::config::load_config_from;

pub fn execute(
    bank_path: PathBuf,
    seed: Option<u64>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank = parse_bank(&bank_path)?;

    let seed = seed.unwrap_or_else(|| {
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .unsigned_abs()
    });

    let catalog = sample_catalog(&bank, &config.sampling, seed);
    let json = serde_json::to_string_pretty(&catalog).context("failed to serialize catalog")?;

    eprintln!(
        "Sampled {} questions in {} sections from '{}' (seed {seed})",
        catalog.question_count(),
        catalog.sections.len(),
        bank.id
    );

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write catalog to {}", path.display()))?;
            eprintln!("Catalog saved to: {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
