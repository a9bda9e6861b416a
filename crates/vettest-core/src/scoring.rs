//! Section aggregation.
//!
//! Reduces one section's questions and the respondent's answers into a
//! percentage, a weighted contribution, and the trap-question tally that the
//! evaluation aggregator rolls up.

use serde::{Deserialize, Serialize};

use crate::classifier::is_correct;
use crate::model::{AnswerSet, Section};
use crate::report::SectionResult;

/// Answered/correct counts for normal (non-trap) questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalTally {
    pub answered: u32,
    pub correct: u32,
}

/// Answered/incorrect counts for trap questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapTally {
    pub answered: u32,
    pub incorrect: u32,
}

/// Everything the evaluation aggregator needs from one section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionScore {
    pub result: SectionResult,
    pub normal: NormalTally,
    pub traps: TrapTally,
}

/// Score one section.
///
/// Unanswered normal questions are left out of the denominator rather than
/// counted as wrong; unanswered trap questions count toward neither tally.
/// `section_index` and `role` build the positional answer locator.
pub fn score_section(
    section: &Section,
    section_index: usize,
    role: &str,
    answers: &AnswerSet,
) -> SectionScore {
    let mut normal = NormalTally::default();
    let mut traps = TrapTally::default();

    for (question_index, question) in section.questions.iter().enumerate() {
        let Some(answer) = answers.lookup(role, section_index, question_index, &question.id)
        else {
            continue;
        };

        let correct = is_correct(question, Some(answer));
        if question.is_trap {
            traps.answered += 1;
            if !correct {
                traps.incorrect += 1;
            }
        } else {
            normal.answered += 1;
            if correct {
                normal.correct += 1;
            }
        }
    }

    let percentage = if normal.answered > 0 {
        100.0 * f64::from(normal.correct) / f64::from(normal.answered)
    } else {
        0.0
    };

    let weight = effective_weight(section);
    let contribution = percentage * weight / 100.0;

    tracing::debug!(
        section = %section.name,
        answered = normal.answered,
        correct = normal.correct,
        trap_incorrect = traps.incorrect,
        percentage,
        contribution,
        "scored section"
    );

    SectionScore {
        result: SectionResult {
            name: section.name.clone(),
            percentage,
            weight,
            contribution,
        },
        normal,
        traps,
    }
}

/// Negative or non-finite weights contribute nothing.
fn effective_weight(section: &Section) -> f64 {
    if section.weight.is_finite() && section.weight >= 0.0 {
        section.weight
    } else {
        tracing::warn!(
            section = %section.name,
            weight = section.weight,
            "ignoring invalid section weight"
        );
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, AnswerKey, Question};

    const ROLE: &str = "jefe_planta";

    fn key(q: usize) -> AnswerKey {
        AnswerKey::position(ROLE, 0, q)
    }

    fn section() -> Section {
        Section::new(
            "Safety",
            40.0,
            vec![
                Question::open("s1", "Helmet?"),
                Question::open("s2", "Gloves?"),
                Question::open("s3", "Boots?"),
                Question::open("t1", "Ever skipped a check?").into_trap(),
            ],
        )
    }

    #[test]
    fn all_correct_gives_full_percentage() {
        let answers = AnswerSet::new()
            .with(key(0), Answer::yes())
            .with(key(1), Answer::yes())
            .with(key(2), Answer::yes())
            .with(key(3), Answer::no());

        let score = score_section(&section(), 0, ROLE, &answers);
        assert_eq!(score.result.percentage, 100.0);
        assert_eq!(score.result.weight, 40.0);
        assert_eq!(score.result.contribution, 40.0);
        assert_eq!(score.normal, NormalTally { answered: 3, correct: 3 });
        assert_eq!(score.traps, TrapTally { answered: 1, incorrect: 0 });
    }

    #[test]
    fn unanswered_normal_questions_leave_the_denominator() {
        let answers = AnswerSet::new()
            .with(key(0), Answer::yes())
            .with(key(1), Answer::no());

        let score = score_section(&section(), 0, ROLE, &answers);
        assert_eq!(score.normal, NormalTally { answered: 2, correct: 1 });
        assert_eq!(score.result.percentage, 50.0);
        assert_eq!(score.result.contribution, 20.0);
        assert_eq!(score.traps, TrapTally::default());
    }

    #[test]
    fn trap_answers_do_not_touch_the_percentage() {
        let answers = AnswerSet::new()
            .with(key(0), Answer::yes())
            .with(key(3), Answer::yes());

        let score = score_section(&section(), 0, ROLE, &answers);
        assert_eq!(score.result.percentage, 100.0);
        assert_eq!(score.traps, TrapTally { answered: 1, incorrect: 1 });
    }

    #[test]
    fn no_answers_scores_zero() {
        let score = score_section(&section(), 0, ROLE, &AnswerSet::new());
        assert_eq!(score.result.percentage, 0.0);
        assert_eq!(score.result.contribution, 0.0);
        assert_eq!(score.normal.answered, 0);
    }

    #[test]
    fn answers_for_other_sections_are_ignored() {
        let answers = AnswerSet::new().with(AnswerKey::position(ROLE, 1, 0), Answer::yes());
        let score = score_section(&section(), 0, ROLE, &answers);
        assert_eq!(score.normal.answered, 0);
    }

    #[test]
    fn answers_by_question_id_are_found() {
        let answers = AnswerSet::new()
            .with(AnswerKey::id("s1"), Answer::yes())
            .with(AnswerKey::id("t1"), Answer::not_applicable());

        let score = score_section(&section(), 0, ROLE, &answers);
        assert_eq!(score.normal, NormalTally { answered: 1, correct: 1 });
        assert_eq!(score.traps, TrapTally { answered: 1, incorrect: 1 });
    }

    #[test]
    fn invalid_weight_contributes_nothing() {
        let mut s = section();
        s.weight = f64::NAN;
        let answers = AnswerSet::new().with(key(0), Answer::yes());
        let score = score_section(&s, 0, ROLE, &answers);
        assert_eq!(score.result.percentage, 100.0);
        assert_eq!(score.result.contribution, 0.0);
    }
}
