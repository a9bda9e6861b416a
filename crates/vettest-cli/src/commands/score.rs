//! The `vettest score` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use vettest_core::parser::{parse_answers, parse_catalog, unmatched_answer_keys};
use vettest_core::report::EvaluationReport;
use vettest_core::traits::EvaluationRecord;
use vettest_core::Evaluator;
use vettest_store::config::{create_store, load_config_from};
use vettest_store::persist_with_retry;

/// Exit code for a completed evaluation that did not pass.
const REJECTED_EXIT_CODE: i32 = 2;

const FORMATS: &[&str] = &["text", "json", "markdown", "md"];

pub struct ScoreArgs {
    pub catalog: PathBuf,
    pub answers: PathBuf,
    pub name: String,
    pub format: String,
    pub output: Option<PathBuf>,
    pub save: bool,
    pub fail_on_reject: bool,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: ScoreArgs) -> Result<()> {
    if !FORMATS.contains(&args.format.as_str()) {
        bail!("Unknown format: {} (expected text, json or markdown)", args.format);
    }

    let config = load_config_from(args.config.as_deref())?;
    let catalog = parse_catalog(&args.catalog)?;
    let answers = parse_answers(&args.answers)?;

    for key in unmatched_answer_keys(&catalog, &answers) {
        tracing::warn!(%key, "answer does not match any question in the catalog");
    }

    let report = Evaluator::new(config.policy).evaluate(&catalog, &answers);

    match args.format.as_str() {
        "markdown" | "md" => {
            println!("# {} ({})\n", display_title(&catalog.title, &catalog.id), args.name);
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => print_text(&args.name, &report),
    }

    if let Some(path) = &args.output {
        report.save_json(path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    if args.save {
        let record = EvaluationRecord::new(args.name.clone(), &catalog, answers, report.clone());
        let store = create_store(&config.store);
        persist_with_retry(
            store.as_ref(),
            &record,
            config.max_retries,
            Duration::from_millis(config.retry_delay_ms),
        )
        .await
        .with_context(|| format!("failed to save evaluation to {} store", store.name()))?;
        eprintln!("Saved evaluation {}", record.id);
    }

    if args.fail_on_reject && !report.pass {
        std::process::exit(REJECTED_EXIT_CODE);
    }

    Ok(())
}

fn display_title<'a>(title: &'a str, id: &'a str) -> &'a str {
    if title.is_empty() {
        id
    } else {
        title
    }
}

fn print_text(name: &str, report: &EvaluationReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Section", "Weight", "Score", "Contribution"]);
    for s in &report.per_section {
        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(format!("{:.1}%", s.weight)),
            Cell::new(format!("{:.1}%", s.percentage)),
            Cell::new(format!("{:.2}", s.contribution)),
        ]);
    }

    println!("{table}");
    println!(
        "{name}: {} with {}% ({} band {}-{})",
        report.verdict(),
        report.total_score,
        report.band,
        report.policy.approval_min,
        report.policy.approval_max
    );
    println!(
        "Trap errors: {} of {} allowed ({} answered)",
        report.trap_incorrect_count, report.policy.max_trap_errors, report.trap_question_count
    );
}
