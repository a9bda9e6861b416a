//! Persistence seam.
//!
//! The scoring engine never stores anything. Callers wrap a finished
//! [`EvaluationReport`] in an [`EvaluationRecord`] and hand it to a
//! [`ResultStore`]; implementations live in the `vettest-store` crate.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{AnswerSet, Catalog};
use crate::report::EvaluationReport;

// ---------------------------------------------------------------------------
// Result store trait
// ---------------------------------------------------------------------------

/// Storage backend for finished evaluations.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Human-readable backend name (e.g. "file").
    fn name(&self) -> &str;

    /// Persist a record. Fails with [`StoreError::Conflict`] if the id is taken.
    async fn save(&self, record: &EvaluationRecord) -> Result<(), StoreError>;

    /// Fetch a record by id.
    async fn get(&self, id: &Uuid) -> Result<EvaluationRecord, StoreError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<EvaluationRecord>, StoreError>;
}

// ---------------------------------------------------------------------------
// Persisted record shape
// ---------------------------------------------------------------------------

/// Persisted verdict label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassStatus {
    #[serde(rename = "APROBADO")]
    Approved,
    #[serde(rename = "REPROBADO")]
    Failed,
}

impl From<bool> for PassStatus {
    fn from(pass: bool) -> Self {
        if pass {
            PassStatus::Approved
        } else {
            PassStatus::Failed
        }
    }
}

/// Per-section grade in the persisted shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionGrade {
    #[serde(rename = "porcentaje")]
    pub percentage: f64,
    #[serde(rename = "ponderacion")]
    pub weight: f64,
    #[serde(rename = "contribucion")]
    pub contribution: f64,
}

/// A stored evaluation.
///
/// Field names on the wire follow the results schema the evaluation history
/// has always used (`total_obtenido`, `calificaciones_secciones`, ...); the
/// full engine report rides along under `report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// Respondent name.
    #[serde(rename = "nombre")]
    pub respondent: String,
    /// When the evaluation was completed.
    #[serde(rename = "fecha")]
    pub created_at: DateTime<Utc>,
    /// Evaluation type (e.g. "personal").
    #[serde(rename = "tipo_evaluacion")]
    pub evaluation_kind: String,
    /// Catalog the respondent answered.
    pub catalog_id: String,
    /// Section name → grade.
    #[serde(rename = "calificaciones_secciones")]
    pub section_grades: BTreeMap<String, SectionGrade>,
    /// Rounded total score.
    #[serde(rename = "total_obtenido")]
    pub total_score: u32,
    /// Raw answers as submitted.
    #[serde(rename = "respuestas")]
    pub answers: AnswerSet,
    /// Free-form notes.
    #[serde(rename = "observaciones", default)]
    pub notes: String,
    pub pass_status: PassStatus,
    pub trap_incorrect_count: u32,
    /// The complete engine output.
    pub report: EvaluationReport,
}

impl EvaluationRecord {
    /// Wrap a report in a new record with a fresh id and timestamp.
    pub fn new(
        respondent: impl Into<String>,
        catalog: &Catalog,
        answers: AnswerSet,
        report: EvaluationReport,
    ) -> Self {
        let section_grades = report
            .per_section
            .iter()
            .map(|s| {
                (
                    s.name.clone(),
                    SectionGrade {
                        percentage: s.percentage,
                        weight: s.weight,
                        contribution: s.contribution,
                    },
                )
            })
            .collect();

        let title = if catalog.title.is_empty() {
            catalog.id.as_str()
        } else {
            catalog.title.as_str()
        };

        Self {
            id: Uuid::new_v4(),
            respondent: respondent.into(),
            created_at: Utc::now(),
            evaluation_kind: catalog.kind.clone(),
            catalog_id: catalog.id.clone(),
            section_grades,
            total_score: report.total_score,
            answers,
            notes: format!(
                "Evaluation completed: {title}, score {}%",
                report.total_score
            ),
            pass_status: report.pass.into(),
            trap_incorrect_count: report.trap_incorrect_count,
            report,
        }
    }

    /// Replace the generated notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn passed(&self) -> bool {
        self.pass_status == PassStatus::Approved
    }
}
