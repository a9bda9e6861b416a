//! Seeded question sampling.
//!
//! A [`QuestionBank`] holds every question that could be asked. Sampling
//! draws a concrete [`Catalog`] from it: a handful of normal questions per
//! section plus trap questions dealt from a shared pool. The same bank, plan
//! and seed always produce the same catalog.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::model::{
    check_section_weights, default_catalog_id, default_kind, default_role, Catalog, Question,
    Section,
};

/// All candidate questions for one evaluation type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    #[serde(default = "default_catalog_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Scored sections with their normal question pools.
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Shared trap pool.
    #[serde(default)]
    pub traps: Vec<Question>,
}

impl QuestionBank {
    pub fn check_weights(&self) -> Result<(), CatalogError> {
        check_section_weights(&self.sections)
    }

    /// Use the bank as-is, without sampling.
    ///
    /// Inline trap questions stay where they are. The shared trap pool has no
    /// section to live in, so it is dropped with a warning.
    pub fn into_catalog(self) -> Catalog {
        if !self.traps.is_empty() {
            tracing::warn!(
                catalog = %self.id,
                traps = self.traps.len(),
                "trap pool ignored; sample the bank to deal traps into sections"
            );
        }
        Catalog {
            id: self.id,
            title: self.title,
            role: self.role,
            kind: self.kind,
            sections: self.sections,
        }
    }

    /// Every trap question the sampler can deal: the explicit pool, inline
    /// traps, and the questions of zero-weight sections. Deduplicated by id.
    fn trap_pool(&self) -> Vec<Question> {
        let inline = self.sections.iter().flat_map(|section| {
            let whole_section = section.weight == 0.0;
            section
                .questions
                .iter()
                .filter(move |q| whole_section || q.is_trap)
        });

        let mut seen = HashSet::new();
        self.traps
            .iter()
            .chain(inline)
            .filter(|q| q.id.is_empty() || seen.insert(q.id.clone()))
            .map(|q| q.clone().into_trap())
            .collect()
    }
}

impl From<Catalog> for QuestionBank {
    fn from(catalog: Catalog) -> Self {
        Self {
            id: catalog.id,
            title: catalog.title,
            role: catalog.role,
            kind: catalog.kind,
            sections: catalog.sections,
            traps: Vec::new(),
        }
    }
}

/// How many questions to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingPlan {
    #[serde(default = "default_questions_per_section")]
    pub questions_per_section: usize,
    #[serde(default = "default_traps_per_section")]
    pub traps_per_section: usize,
    /// The shuffled trap pool is cut to this size before dealing.
    #[serde(default = "default_trap_pool_limit")]
    pub trap_pool_limit: usize,
    /// Shuffle question order inside each sampled section.
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
}

fn default_questions_per_section() -> usize {
    5
}
fn default_traps_per_section() -> usize {
    1
}
fn default_trap_pool_limit() -> usize {
    100
}
fn default_shuffle() -> bool {
    true
}

impl Default for SamplingPlan {
    fn default() -> Self {
        Self {
            questions_per_section: default_questions_per_section(),
            traps_per_section: default_traps_per_section(),
            trap_pool_limit: default_trap_pool_limit(),
            shuffle: default_shuffle(),
        }
    }
}

/// Draw a catalog from a bank.
///
/// Zero-weight sections are trap pools and do not appear in the result.
/// Traps are dealt in section order, each at most once; once the pool runs
/// dry, later sections get none.
pub fn sample_catalog(bank: &QuestionBank, plan: &SamplingPlan, seed: u64) -> Catalog {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut pool = bank.trap_pool();
    pool.shuffle(&mut rng);
    pool.truncate(plan.trap_pool_limit);
    let mut pool = pool.into_iter();

    let mut sections = Vec::new();
    for section in bank.sections.iter().filter(|s| s.weight != 0.0) {
        let normal: Vec<&Question> = section.questions.iter().filter(|q| !q.is_trap).collect();

        let mut picked: Vec<usize> = (0..normal.len()).collect();
        picked.shuffle(&mut rng);
        picked.truncate(plan.questions_per_section);
        if !plan.shuffle {
            picked.sort_unstable();
        }

        let mut questions: Vec<Question> = picked.into_iter().map(|i| normal[i].clone()).collect();
        questions.extend(pool.by_ref().take(plan.traps_per_section));
        if plan.shuffle {
            questions.shuffle(&mut rng);
        }

        tracing::debug!(
            section = %section.name,
            questions = questions.len(),
            "sampled section"
        );
        sections.push(Section::new(section.name.clone(), section.weight, questions));
    }

    Catalog {
        id: bank.id.clone(),
        title: bank.title.clone(),
        role: bank.role.clone(),
        kind: bank.kind.clone(),
        sections,
    }
}
