//! Catalog and answer file parser.
//!
//! Loads question banks and catalogs from TOML or JSON files and
//! directories, and validates them. JSON input may also be the legacy
//! question API envelope (`{"success": .., "data": [sections], "error": ..}`).

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::CatalogError;
use crate::model::{
    default_catalog_id, default_kind, default_role, AnswerKey, AnswerSet, Catalog, Question,
    Section,
};
use crate::sampling::QuestionBank;

/// Intermediate TOML structure for catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    #[serde(default)]
    catalog: TomlCatalogHeader,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    traps: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    #[serde(default = "default_catalog_id")]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default = "default_role")]
    role: String,
    #[serde(default = "default_kind")]
    kind: String,
}

impl Default for TomlCatalogHeader {
    fn default() -> Self {
        Self {
            id: default_catalog_id(),
            title: String::new(),
            role: default_role(),
            kind: default_kind(),
        }
    }
}

/// Legacy question API response.
#[derive(Debug, Deserialize)]
struct LegacyEnvelope {
    success: bool,
    #[serde(default)]
    data: Vec<Section>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse a bank file (`.toml` or `.json`).
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse bank content; the format is picked from the path's extension.
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let bank = if is_json(source_path) {
        parse_json_bank(content, source_path)?
    } else {
        let parsed: TomlCatalogFile = toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
        QuestionBank {
            id: parsed.catalog.id,
            title: parsed.catalog.title,
            role: parsed.catalog.role,
            kind: parsed.catalog.kind,
            sections: parsed.sections,
            traps: parsed
                .traps
                .into_iter()
                .map(Question::into_trap)
                .collect(),
        }
    };

    bank.check_weights()
        .with_context(|| format!("invalid catalog: {}", source_path.display()))?;
    Ok(bank)
}

fn parse_json_bank(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let value: serde_json::Value = serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;

    if value.get("success").is_some() {
        let envelope: LegacyEnvelope = serde_json::from_value(value)
            .with_context(|| format!("invalid legacy payload: {}", source_path.display()))?;
        if !envelope.success {
            let message = envelope
                .error
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(CatalogError::SourceFailed(message).into());
        }
        let stem = source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(default_catalog_id);
        return Ok(QuestionBank {
            id: stem,
            title: String::new(),
            role: default_role(),
            kind: default_kind(),
            sections: envelope.data,
            traps: Vec::new(),
        });
    }

    serde_json::from_value(value)
        .with_context(|| format!("invalid catalog JSON: {}", source_path.display()))
}

/// Parse a catalog file for scoring, without sampling.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    Ok(parse_bank(path)?.into_catalog())
}

/// Parse catalog content for scoring (useful for testing).
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    Ok(parse_bank_str(content, source_path)?.into_catalog())
}

/// Recursively load every `.toml` and `.json` bank under a directory.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_catalog_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Parse an answer file: a flat JSON object (or TOML table) of
/// locator → answer strings.
pub fn parse_answers(path: &Path) -> Result<AnswerSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file: {}", path.display()))?;

    if is_json(path) {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse answers JSON: {}", path.display()))
    } else {
        toml::from_str(&content)
            .with_context(|| format!("failed to parse answers TOML: {}", path.display()))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The section name (if applicable).
    pub section: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(section: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            section: section.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Validate a catalog for common authoring mistakes.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    validate_sections(&catalog.sections, &[])
}

/// Validate a bank, including its trap pool.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = validate_sections(&bank.sections, &bank.traps);
    let scored = bank.sections.iter().filter(|s| s.weight > 0.0).count();
    let pool_size = bank.traps.len()
        + bank
            .sections
            .iter()
            .filter(|s| s.weight == 0.0)
            .map(|s| s.questions.len())
            .sum::<usize>();
    let inline_traps = bank
        .sections
        .iter()
        .any(|s| s.questions.iter().any(|q| q.is_trap));
    if scored > 0 && pool_size == 0 && !inline_traps {
        warnings.push(ValidationWarning::new(None, "no trap questions available"));
    }
    warnings
}

fn validate_sections(sections: &[Section], pool: &[Question]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Weight sum
    let scored: Vec<&Section> = sections.iter().filter(|s| s.weight > 0.0).collect();
    let weight_sum: f64 = scored.iter().map(|s| s.weight).sum();
    if !scored.is_empty() && (weight_sum - 100.0).abs() > 1e-6 {
        warnings.push(ValidationWarning::new(
            None,
            format!("section weights sum to {weight_sum}, not 100"),
        ));
    }

    // Duplicate section names
    let mut seen_names = HashSet::new();
    for section in sections {
        if !seen_names.insert(section.name.as_str()) {
            warnings.push(ValidationWarning::new(
                Some(section.name.as_str()),
                format!("duplicate section name: {}", section.name),
            ));
        }
    }

    // Empty sections and sections that can never score
    for section in sections {
        if section.questions.is_empty() {
            warnings.push(ValidationWarning::new(
                Some(section.name.as_str()),
                "section has no questions",
            ));
        } else if section.weight > 0.0 && section.questions.iter().all(|q| q.is_trap) {
            warnings.push(ValidationWarning::new(
                Some(section.name.as_str()),
                "section has no normal questions; its percentage is always 0",
            ));
        }
    }

    // Trap ids placed in more than one section
    let mut trap_homes: HashMap<&str, Vec<&str>> = HashMap::new();
    for section in sections {
        let mut in_section = HashSet::new();
        for q in section.questions.iter().filter(|q| q.is_trap && !q.id.is_empty()) {
            if in_section.insert(q.id.as_str()) {
                trap_homes
                    .entry(q.id.as_str())
                    .or_default()
                    .push(section.name.as_str());
            }
        }
    }
    let mut shared: Vec<_> = trap_homes
        .into_iter()
        .filter(|(_, homes)| homes.len() > 1)
        .collect();
    shared.sort();
    for (id, homes) in shared {
        warnings.push(ValidationWarning::new(
            None,
            format!("trap question {id} appears in sections: {}", homes.join(", ")),
        ));
    }

    // Duplicate question ids
    let mut seen_ids = HashSet::new();
    let mut reported = HashSet::new();
    let all = sections
        .iter()
        .flat_map(|s| s.questions.iter().map(move |q| (Some(s.name.as_str()), q)))
        .chain(pool.iter().map(|q| (None, q)));
    for (section, q) in all {
        if q.id.is_empty() {
            continue;
        }
        if !seen_ids.insert(q.id.as_str()) && reported.insert(q.id.as_str()) {
            warnings.push(ValidationWarning::new(
                section,
                format!("duplicate question id: {}", q.id),
            ));
        }
    }

    warnings
}

/// Answer keys that do not address any question in the catalog.
pub fn unmatched_answer_keys(catalog: &Catalog, answers: &AnswerSet) -> Vec<AnswerKey> {
    let ids: HashSet<&str> = catalog
        .sections
        .iter()
        .flat_map(|s| s.questions.iter().map(|q| q.id.as_str()))
        .collect();

    answers
        .iter()
        .filter_map(|(key, _)| {
            let matched = match &key {
                AnswerKey::Position {
                    role,
                    section,
                    question,
                } => {
                    *role == catalog.role
                        && catalog
                            .sections
                            .get(*section)
                            .is_some_and(|s| *question < s.questions.len())
                }
                AnswerKey::Id(id) => ids.contains(id.as_str()),
            };
            (!matched).then_some(key)
        })
        .collect()
}
