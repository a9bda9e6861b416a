//! Evaluation report types with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::{ApprovalPolicy, ScoreBand};

/// Per-section outcome. Derived, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionResult {
    /// Section name.
    pub name: String,
    /// Share of answered normal questions that were correct, 0–100.
    pub percentage: f64,
    /// Weight copied from the section.
    pub weight: f64,
    /// `percentage * weight / 100`.
    pub contribution: f64,
}

/// The scoring engine's output for one completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Weighted sum of section contributions, rounded half-up.
    pub total_score: u32,
    /// The unrounded weighted sum.
    pub raw_score: f64,
    /// Section results in catalog order.
    pub per_section: Vec<SectionResult>,
    /// Trap questions that were answered.
    pub trap_question_count: u32,
    /// Answered trap questions classified as incorrect.
    pub trap_incorrect_count: u32,
    /// Normal questions that were answered.
    pub normal_question_count: u32,
    /// Answered normal questions classified as correct.
    pub normal_correct_count: u32,
    /// Where `total_score` falls relative to the approval band.
    pub band: ScoreBand,
    /// Final verdict.
    pub pass: bool,
    /// Policy the verdict was computed under.
    pub policy: ApprovalPolicy,
}

impl EvaluationReport {
    /// Look up a section result by name.
    pub fn section(&self, name: &str) -> Option<&SectionResult> {
        self.per_section.iter().find(|s| s.name == name)
    }

    /// Verdict label used in persisted records and console output.
    pub fn verdict(&self) -> &'static str {
        if self.pass {
            "APROBADO"
        } else {
            "REPROBADO"
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: EvaluationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Verdict:** {} at {}% ({} band {}-{})\n\n",
            self.verdict(),
            self.total_score,
            self.band,
            self.policy.approval_min,
            self.policy.approval_max
        ));
        md.push_str(&format!(
            "**Trap errors:** {} / {} allowed ({} answered)\n\n",
            self.trap_incorrect_count, self.policy.max_trap_errors, self.trap_question_count
        ));
        md.push_str(&format!(
            "**Normal questions:** {} correct of {} answered\n\n",
            self.normal_correct_count, self.normal_question_count
        ));

        if !self.per_section.is_empty() {
            md.push_str("| Section | Weight | Score | Contribution |\n");
            md.push_str("|---------|--------|-------|--------------|\n");
            for s in &self.per_section {
                md.push_str(&format!(
                    "| {} | {:.1}% | {:.1}% | {:.2} |\n",
                    s.name, s.weight, s.percentage, s.contribution
                ));
            }
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_report(total_score: u32, pass: bool) -> EvaluationReport {
        EvaluationReport {
            total_score,
            raw_score: total_score as f64,
            per_section: vec![
                SectionResult {
                    name: "Seguridad".into(),
                    percentage: 100.0,
                    weight: 60.0,
                    contribution: 60.0,
                },
                SectionResult {
                    name: "Calidad".into(),
                    percentage: 75.0,
                    weight: 40.0,
                    contribution: 30.0,
                },
            ],
            trap_question_count: 2,
            trap_incorrect_count: 1,
            normal_question_count: 6,
            normal_correct_count: 5,
            band: ScoreBand::Within,
            pass,
            policy: ApprovalPolicy::default(),
        }
    }

    #[test]
    fn section_lookup() {
        let report = make_report(90, true);
        assert_eq!(report.section("Calidad").unwrap().contribution, 30.0);
        assert!(report.section("Missing").is_none());
    }

    #[test]
    fn verdict_labels() {
        assert_eq!(make_report(90, true).verdict(), "APROBADO");
        assert_eq!(make_report(90, false).verdict(), "REPROBADO");
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(90, true);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = EvaluationReport::load_json(&path).unwrap();

        assert_eq!(loaded, report);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EvaluationReport::load_json(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn markdown_output() {
        let md = make_report(90, true).to_markdown();
        assert!(md.contains("APROBADO"));
        assert!(md.contains("| Seguridad | 60.0% | 100.0% | 60.00 |"));
        assert!(md.contains("1 / 2 allowed"));
    }
}
