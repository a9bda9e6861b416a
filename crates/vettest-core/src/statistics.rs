//! Aggregate statistics over persisted evaluations.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::engine::ScoreBand;
use crate::traits::EvaluationRecord;

/// Summary of an evaluation history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total: usize,
    pub approved: usize,
    pub failed: usize,
    /// Mean total score, rounded half-up. Zero for an empty history.
    pub average_score: u32,
    /// Section name → mean percentage across records that contain it.
    pub section_averages: BTreeMap<String, f64>,
    /// How many records fell in each score band.
    pub bands: BTreeMap<ScoreBand, usize>,
}

impl HistorySummary {
    /// Share of approved evaluations, 0.0–1.0.
    pub fn approval_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.approved as f64 / self.total as f64
        }
    }
}

/// Summarize a set of records.
pub fn summarize_history(records: &[EvaluationRecord]) -> HistorySummary {
    if records.is_empty() {
        return HistorySummary::default();
    }

    let approved = records.iter().filter(|r| r.passed()).count();

    let score_sum: f64 = records.iter().map(|r| f64::from(r.total_score)).sum();
    let average_score = (score_sum / records.len() as f64 + 0.5).floor() as u32;

    let mut per_section: HashMap<&str, (f64, usize)> = HashMap::new();
    for record in records {
        for (name, grade) in &record.section_grades {
            let entry = per_section.entry(name.as_str()).or_default();
            entry.0 += grade.percentage;
            entry.1 += 1;
        }
    }
    let section_averages = per_section
        .into_iter()
        .map(|(name, (sum, count))| (name.to_string(), sum / count as f64))
        .collect();

    let mut bands = BTreeMap::new();
    for record in records {
        *bands.entry(record.report.band).or_insert(0) += 1;
    }

    HistorySummary {
        total: records.len(),
        approved,
        failed: records.len() - approved,
        average_score,
        section_averages,
        bands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{evaluate, ApprovalPolicy};
    use crate::model::{Answer, AnswerKey, AnswerSet, Catalog, Question, Section};

    fn catalog() -> Catalog {
        Catalog {
            id: "c".into(),
            title: "History".into(),
            role: "r".into(),
            kind: "personal".into(),
            sections: vec![
                Section::new(
                    "A",
                    50.0,
                    (0..10).map(|i| Question::open(format!("a{i}"), "x")).collect(),
                ),
                Section::new(
                    "B",
                    50.0,
                    (0..10).map(|i| Question::open(format!("b{i}"), "x")).collect(),
                ),
            ],
        }
    }

    /// Answer `wrong` questions of section A with "no", everything else "yes".
    fn record(wrong: usize) -> EvaluationRecord {
        let catalog = catalog();
        let mut answers = AnswerSet::new();
        for s in 0..2 {
            for q in 0..10 {
                let answer = if s == 0 && q < wrong {
                    Answer::no()
                } else {
                    Answer::yes()
                };
                answers.insert(AnswerKey::position("r", s, q), answer);
            }
        }
        let report = evaluate(
            &catalog.sections,
            &catalog.role,
            &answers,
            &ApprovalPolicy::default(),
        );
        EvaluationRecord::new("Ana", &catalog, answers, report)
    }

    #[test]
    fn empty_history() {
        let summary = summarize_history(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_score, 0);
        assert_eq!(summary.approval_rate(), 0.0);
    }

    #[test]
    fn summary_counts_and_averages() {
        // 100 (above), 90 (within), 70 (below)
        let records = vec![record(0), record(2), record(6)];
        let summary = summarize_history(&records);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.approved, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.average_score, 87);
        assert!((summary.section_averages["A"] - 220.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.section_averages["B"], 100.0);
        assert_eq!(summary.bands[&ScoreBand::Above], 1);
        assert_eq!(summary.bands[&ScoreBand::Within], 1);
        assert_eq!(summary.bands[&ScoreBand::Below], 1);
        assert!((summary.approval_rate() - 1.0 / 3.0).abs() < 1e-9);
    }
}
