//! The `vettest history` command.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use comfy_table::{Cell, Table};

use vettest_core::statistics::{summarize_history, HistorySummary};
use vettest_store::config::{create_store, load_config_from};

pub async fn execute(format: String, config_path: Option<PathBuf>) -> Result<()> {
    if format != "text" && format != "json" {
        bail!("Unknown format: {format} (expected text or json)");
    }

    let config = load_config_from(config_path.as_deref())?;
    let store = create_store(&config.store);
    let records = store
        .list()
        .await
        .with_context(|| format!("failed to list evaluations from {} store", store.name()))?;
    let summary = summarize_history(&records);

    if format == "json" {
        let out = serde_json::json!({
            "records": records,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No evaluations recorded.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Name", "Type", "Score", "Trap errors", "Status"]);
    for r in &records {
        table.add_row(vec![
            Cell::new(r.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&r.respondent),
            Cell::new(&r.evaluation_kind),
            Cell::new(format!("{}%", r.total_score)),
            Cell::new(r.trap_incorrect_count),
            Cell::new(r.report.verdict()),
        ]);
    }
    println!("{table}");
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &HistorySummary) {
    println!(
        "\n{} evaluation(s): {} approved, {} failed ({:.1}% approval), average score {}%",
        summary.total,
        summary.approved,
        summary.failed,
        summary.approval_rate() * 100.0,
        summary.average_score
    );

    if !summary.section_averages.is_empty() {
        println!("Section averages:");
        for (name, avg) in &summary.section_averages {
            println!("  {name}: {avg:.1}%");
        }
    }

    let bands: Vec<String> = summary
        .bands
        .iter()
        .map(|(band, count)| format!("{band}: {count}"))
        .collect();
    println!("Bands: {}", bands.join(", "));
}
