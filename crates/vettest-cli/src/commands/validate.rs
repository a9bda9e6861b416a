//! The `vettest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use vettest_core::parser::{load_catalog_directory, parse_bank, validate_bank};

pub fn execute(catalog_path: PathBuf) -> Result<()> {
    let banks = if catalog_path.is_dir() {
        load_catalog_directory(&catalog_path)?
    } else {
        vec![parse_bank(&catalog_path)?]
    };

    let mut total_warnings = 0;

    for bank in &banks {
        let questions: usize = bank.sections.iter().map(|s| s.questions.len()).sum();
        println!(
            "Catalog: {} ({} sections, {} questions, {} pooled traps)",
            bank.id,
            bank.sections.len(),
            questions,
            bank.traps.len()
        );

        let warnings = validate_bank(bank);
        for w in &warnings {
            let prefix = w
                .section
                .as_ref()
                .map(|name| format!("  [{name}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All catalogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
