//! vettest-core — Scoring engine, data model, and catalog tooling.
//!
//! This crate defines the question catalog and answer model, the pure
//! scoring pipeline (answer classifier, section aggregator, evaluation
//! aggregator), and the collaborator-facing pieces the rest of vettest
//! builds on: catalog parsing, seeded sampling, and the persistence trait.

pub mod classifier;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod sampling;
pub mod scoring;
pub mod statistics;
pub mod traits;

pub use engine::{evaluate, ApprovalPolicy, Evaluator, ScoreBand};
pub use model::{Answer, AnswerKey, AnswerSet, Catalog, Question, QuestionKind, Reply, Section};
pub use report::{EvaluationReport, SectionResult};
pub use error::{CatalogError, PolicyError, StoreError};
pub use sampling::{sample_catalog, QuestionBank, SamplingPlan};
pub use statistics::{summarize_history, HistorySummary};
pub use traits::{EvaluationRecord, PassStatus, ResultStore};
