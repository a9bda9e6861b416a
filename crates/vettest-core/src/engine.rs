//! Evaluation aggregator.
//!
//! Runs the section aggregator over every section of a catalog, folds the
//! results into a total score, and applies the dual approval policy: the
//! score must fall inside a closed band *and* trap errors must stay within
//! budget. Everything here is a pure function of its inputs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::model::{AnswerSet, Catalog, Section};
use crate::report::EvaluationReport;
use crate::scoring::{score_section, NormalTally, TrapTally};

/// Pass/fail thresholds, injected at call time.
///
/// The band is closed on both ends. A perfect score above `approval_max`
/// fails: unnaturally perfect results are treated as suspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    /// Lowest passing total score.
    #[serde(default = "default_approval_min")]
    pub approval_min: u32,
    /// Highest passing total score.
    #[serde(default = "default_approval_max")]
    pub approval_max: u32,
    /// Most trap questions that may be answered incorrectly.
    #[serde(default = "default_max_trap_errors")]
    pub max_trap_errors: u32,
}

fn default_approval_min() -> u32 {
    85
}
fn default_approval_max() -> u32 {
    95
}
fn default_max_trap_errors() -> u32 {
    2
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            approval_min: default_approval_min(),
            approval_max: default_approval_max(),
            max_trap_errors: default_max_trap_errors(),
        }
    }
}

impl ApprovalPolicy {
    pub fn new(
        approval_min: u32,
        approval_max: u32,
        max_trap_errors: u32,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            approval_min,
            approval_max,
            max_trap_errors,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.approval_min > self.approval_max {
            return Err(PolicyError::InvertedBand {
                min: self.approval_min,
                max: self.approval_max,
            });
        }
        Ok(())
    }

    /// Where a total score falls relative to the approval band.
    pub fn band(&self, total_score: u32) -> ScoreBand {
        if total_score < self.approval_min {
            ScoreBand::Below
        } else if total_score > self.approval_max {
            ScoreBand::Above
        } else {
            ScoreBand::Within
        }
    }

    /// Both conditions must hold simultaneously.
    pub fn admits(&self, total_score: u32, trap_incorrect: u32) -> bool {
        self.band(total_score) == ScoreBand::Within && trap_incorrect <= self.max_trap_errors
    }
}

/// Position of a score relative to the approval band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Below,
    Within,
    Above,
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::Below => write!(f, "below"),
            ScoreBand::Within => write!(f, "within"),
            ScoreBand::Above => write!(f, "above"),
        }
    }
}

/// Stateless evaluator bound to one approval policy.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    policy: ApprovalPolicy,
}

impl Evaluator {
    pub fn new(policy: ApprovalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ApprovalPolicy {
        &self.policy
    }

    /// Score a completed session against a catalog.
    pub fn evaluate(&self, catalog: &Catalog, answers: &AnswerSet) -> EvaluationReport {
        evaluate(&catalog.sections, &catalog.role, answers, &self.policy)
    }
}

/// Score a completed session.
///
/// `role` prefixes positional answer keys (`<role>-<section>-<question>`).
/// The total is the literal weighted sum of section contributions, rounded
/// half-up; weights that do not add up to 100 are logged, not corrected.
pub fn evaluate(
    sections: &[Section],
    role: &str,
    answers: &AnswerSet,
    policy: &ApprovalPolicy,
) -> EvaluationReport {
    let weight_sum: f64 = sections.iter().map(|s| s.weight).sum();
    if !sections.is_empty() && (weight_sum - 100.0).abs() > 1e-6 {
        tracing::warn!(weight_sum, "section weights do not sum to 100");
    }

    let mut per_section = Vec::with_capacity(sections.len());
    let mut normal = NormalTally::default();
    let mut traps = TrapTally::default();
    let mut raw_score = 0.0;

    for (index, section) in sections.iter().enumerate() {
        let score = score_section(section, index, role, answers);
        raw_score += score.result.contribution;
        normal.answered += score.normal.answered;
        normal.correct += score.normal.correct;
        traps.answered += score.traps.answered;
        traps.incorrect += score.traps.incorrect;
        per_section.push(score.result);
    }

    let total_score = round_half_up(raw_score);
    let band = policy.band(total_score);
    let answered_any = normal.answered > 0 || traps.answered > 0;
    let pass = answered_any && policy.admits(total_score, traps.incorrect);

    EvaluationReport {
        total_score,
        raw_score,
        per_section,
        trap_question_count: traps.answered,
        trap_incorrect_count: traps.incorrect,
        normal_question_count: normal.answered,
        normal_correct_count: normal.correct,
        band,
        pass,
        policy: *policy,
    }
}

fn round_half_up(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        (value + 0.5).floor() as u32
    } else {
        0
    }
}
