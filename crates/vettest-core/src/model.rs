//! Core data model types for vettest.
//!
//! Questions, sections, and catalogs describe what a respondent is asked;
//! answers and answer sets describe what they replied. The scoring engine
//! consumes both and never mutates them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CatalogError;

/// A single evaluable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion", into = "RawQuestion")]
pub struct Question {
    /// Opaque identifier, stable across sampling.
    pub id: String,
    /// Prompt shown to the respondent.
    pub text: String,
    /// Question type and, for multiple choice, its options.
    pub kind: QuestionKind,
    /// Trap questions are excluded from normal scoring and counted against
    /// the trap-error budget instead.
    pub is_trap: bool,
}

/// Question type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// Choose one of `options`; `correct_choice` is always one of its keys.
    MultipleChoice {
        options: BTreeMap<String, String>,
        correct_choice: String,
    },
    /// Yes / no / not-applicable question.
    Open,
}

impl Question {
    /// Create a normal open (yes/no/na) question.
    pub fn open(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: QuestionKind::Open,
            is_trap: false,
        }
    }

    /// Create a multiple-choice question, enforcing that `correct_choice` is
    /// one of the option keys.
    pub fn multiple_choice<K, V>(
        id: impl Into<String>,
        text: impl Into<String>,
        options: impl IntoIterator<Item = (K, V)>,
        correct_choice: impl Into<String>,
    ) -> Result<Self, CatalogError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        RawQuestion {
            id: id.into(),
            text: text.into(),
            kind: RawKind::MultipleChoice,
            options: Some(
                options
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            correct_choice: Some(correct_choice.into()),
            is_trap: false,
        }
        .try_into()
    }

    /// Mark this question as a trap question.
    pub fn into_trap(mut self) -> Self {
        self.is_trap = true;
        self
    }

    pub fn is_multiple_choice(&self) -> bool {
        matches!(self.kind, QuestionKind::MultipleChoice { .. })
    }
}

/// Flat wire shape of a question, shared by TOML and JSON catalogs.
///
/// Accepts the legacy Spanish field names emitted by the original question
/// API (`pregunta`, `tipo`, `opciones`, `respuesta_correcta`, `es_trampa`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawQuestion {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default, alias = "pregunta")]
    text: String,
    #[serde(rename = "type", alias = "tipo")]
    kind: RawKind,
    #[serde(default, alias = "opciones", skip_serializing_if = "Option::is_none")]
    options: Option<BTreeMap<String, String>>,
    #[serde(
        default,
        alias = "respuesta_correcta",
        skip_serializing_if = "Option::is_none"
    )]
    correct_choice: Option<String>,
    #[serde(default, alias = "es_trampa")]
    is_trap: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawKind {
    #[serde(alias = "seleccion_multiple")]
    MultipleChoice,
    #[serde(alias = "abierta")]
    Open,
}

/// Question ids arrive as strings from TOML and as integers from the legacy API.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

impl TryFrom<RawQuestion> for Question {
    type Error = CatalogError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let kind = match raw.kind {
            RawKind::Open => QuestionKind::Open,
            RawKind::MultipleChoice => {
                let options = raw.options.unwrap_or_default();
                if options.is_empty() {
                    return Err(CatalogError::MissingOptions { question: raw.id });
                }
                let Some(correct_choice) = raw.correct_choice else {
                    return Err(CatalogError::MissingCorrectChoice { question: raw.id });
                };
                if !options.contains_key(&correct_choice) {
                    return Err(CatalogError::UnknownCorrectChoice {
                        question: raw.id,
                        choice: correct_choice,
                    });
                }
                QuestionKind::MultipleChoice {
                    options,
                    correct_choice,
                }
            }
        };

        Ok(Question {
            id: raw.id,
            text: raw.text,
            kind,
            is_trap: raw.is_trap,
        })
    }
}

impl From<Question> for RawQuestion {
    fn from(question: Question) -> Self {
        let (kind, options, correct_choice) = match question.kind {
            QuestionKind::Open => (RawKind::Open, None, None),
            QuestionKind::MultipleChoice {
                options,
                correct_choice,
            } => (RawKind::MultipleChoice, Some(options), Some(correct_choice)),
        };

        RawQuestion {
            id: question.id,
            text: question.text,
            kind,
            options,
            correct_choice,
            is_trap: question.is_trap,
        }
    }
}

/// A named, weighted group of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Display label, unique within an evaluation.
    #[serde(alias = "nombre")]
    pub name: String,
    /// Percentage contribution to the total score.
    #[serde(alias = "ponderacion")]
    pub weight: f64,
    /// Ordered questions; positions feed the answer locator.
    #[serde(default, alias = "preguntas")]
    pub questions: Vec<Question>,
}

impl Section {
    pub fn new(name: impl Into<String>, weight: f64, questions: Vec<Question>) -> Self {
        Self {
            name: name.into(),
            weight,
            questions,
        }
    }
}

/// A fully materialized question catalog, ready for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Unique identifier for this catalog.
    #[serde(default = "default_catalog_id")]
    pub id: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Role being evaluated; prefixes positional answer keys.
    #[serde(default = "default_role")]
    pub role: String,
    /// Evaluation type (e.g. "personal").
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Ordered sections.
    #[serde(default)]
    pub sections: Vec<Section>,
}

pub(crate) fn default_catalog_id() -> String {
    "catalog".to_string()
}

pub fn default_role() -> String {
    "jefe_planta".to_string()
}

pub fn default_kind() -> String {
    "personal".to_string()
}

impl Catalog {
    /// Sum of all section weights. Expected to be 100, but not enforced.
    pub fn total_weight(&self) -> f64 {
        self.sections.iter().map(|s| s.weight).sum()
    }

    /// Total number of questions across all sections.
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    /// Reject weights the engine cannot meaningfully combine.
    pub fn check_weights(&self) -> Result<(), CatalogError> {
        check_section_weights(&self.sections)
    }
}

pub(crate) fn check_section_weights(sections: &[Section]) -> Result<(), CatalogError> {
    for section in sections {
        if !section.weight.is_finite() || section.weight < 0.0 {
            return Err(CatalogError::InvalidWeight {
                section: section.name.clone(),
                weight: section.weight,
            });
        }
    }
    Ok(())
}

/// A respondent's answer to one question, kept exactly as submitted (trimmed).
///
/// Multiple-choice questions compare this text against the option key.
/// Open questions read it through [`Answer::reply`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Answer(String);

/// How an open question reads an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Yes,
    No,
    NotApplicable,
}

impl Answer {
    /// Parse a raw answer value. Blank input means "unanswered" and yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Answer(trimmed.to_string()))
    }

    pub fn yes() -> Self {
        Answer("yes".into())
    }

    pub fn no() -> Self {
        Answer("no".into())
    }

    pub fn not_applicable() -> Self {
        Answer("na".into())
    }

    /// An option key for a multiple-choice question.
    pub fn choice(key: impl Into<String>) -> Self {
        Answer(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Open-question reading, case-insensitive. The legacy spellings
    /// `si`/`sí` and `n/a` are accepted. Anything else is `None`.
    pub fn reply(&self) -> Option<Reply> {
        match self.0.to_lowercase().as_str() {
            "yes" | "si" | "sí" => Some(Reply::Yes),
            "no" => Some(Reply::No),
            "na" | "n/a" => Some(Reply::NotApplicable),
            _ => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Answer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Answer::parse(&raw).ok_or_else(|| serde::de::Error::custom("empty answer value"))
    }
}

/// Locator for one question in an answer set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnswerKey {
    /// `<role>-<section index>-<question index>`, both indices zero-based.
    Position {
        role: String,
        section: usize,
        question: usize,
    },
    /// A stable question id.
    Id(String),
}

impl AnswerKey {
    pub fn position(role: impl Into<String>, section: usize, question: usize) -> Self {
        AnswerKey::Position {
            role: role.into(),
            section,
            question,
        }
    }

    pub fn id(id: impl Into<String>) -> Self {
        AnswerKey::Id(id.into())
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerKey::Position {
                role,
                section,
                question,
            } => write!(f, "{role}-{section}-{question}"),
            AnswerKey::Id(id) => f.write_str(id),
        }
    }
}

impl FromStr for AnswerKey {
    type Err = std::convert::Infallible;

    /// Anything that does not look like `<role>-<n>-<n>` is treated as a question id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, '-');
        if let (Some(question), Some(section), Some(role)) = (parts.next(), parts.next(), parts.next())
        {
            if let (Ok(question), Ok(section)) = (question.parse(), section.parse()) {
                if !role.is_empty() {
                    return Ok(AnswerKey::Position {
                        role: role.to_string(),
                        section,
                        question,
                    });
                }
            }
        }
        Ok(AnswerKey::Id(s.to_string()))
    }
}

/// The respondent's answers, keyed by locator.
///
/// Keys are stored in their string form so positional and id keys that
/// happen to look alike never shadow each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct AnswerSet {
    answers: BTreeMap<String, Answer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer, replacing any earlier one for the same key.
    pub fn insert(&mut self, key: AnswerKey, answer: Answer) {
        self.answers.insert(key.to_string(), answer);
    }

    /// Builder-style variant of [`AnswerSet::insert`].
    pub fn with(mut self, key: AnswerKey, answer: Answer) -> Self {
        self.insert(key, answer);
        self
    }

    /// Remove an answer, returning it if it was present.
    pub fn remove(&mut self, key: &AnswerKey) -> Option<Answer> {
        self.answers.remove(&key.to_string())
    }

    /// Find the answer for a question, trying its positional locator first and
    /// then its id.
    pub fn lookup(
        &self,
        role: &str,
        section: usize,
        question: usize,
        question_id: &str,
    ) -> Option<&Answer> {
        let positional = AnswerKey::position(role, section, question).to_string();
        self.answers.get(&positional).or_else(|| {
            if question_id.is_empty() {
                None
            } else {
                self.answers.get(question_id)
            }
        })
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Iterate over `(key, answer)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (AnswerKey, &Answer)> {
        self.answers.iter().map(|(k, v)| {
            let key = match k.parse::<AnswerKey>() {
                Ok(key) => key,
                Err(never) => match never {},
            };
            (key, v)
        })
    }
}

impl From<BTreeMap<String, String>> for AnswerSet {
    /// Blank values are dropped: they represent unanswered questions.
    fn from(raw: BTreeMap<String, String>) -> Self {
        let answers = raw
            .into_iter()
            .filter_map(|(key, value)| Answer::parse(&value).map(|answer| (key, answer)))
            .collect();
        Self { answers }
    }
}

impl From<AnswerSet> for BTreeMap<String, String> {
    fn from(set: AnswerSet) -> Self {
        set.answers
            .into_iter()
            .map(|(key, answer)| (key, answer.as_str().to_string()))
            .collect()
    }
}

impl FromIterator<(AnswerKey, Answer)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (AnswerKey, Answer)>>(iter: I) -> Self {
        let mut set = AnswerSet::new();
        for (key, answer) in iter {
            set.insert(key, answer);
        }
        set
    }
}
