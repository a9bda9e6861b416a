//! Answer classification.
//!
//! Decides whether one answer to one question counts as correct. There are
//! no error conditions: unanswered or unrecognized values are incorrect.

use crate::model::{Answer, Question, QuestionKind, Reply};

/// Classify a single answer.
///
/// - Multiple choice: correct iff the submitted text is the correct option key.
/// - Open, normal: correct iff the answer reads as `yes`.
/// - Open, trap: correct iff the answer reads as `no`.
pub fn is_correct(question: &Question, answer: Option<&Answer>) -> bool {
    let Some(answer) = answer else {
        return false;
    };

    match &question.kind {
        QuestionKind::MultipleChoice { correct_choice, .. } => answer.as_str() == correct_choice,
        QuestionKind::Open if question.is_trap => answer.reply() == Some(Reply::No),
        QuestionKind::Open => answer.reply() == Some(Reply::Yes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerSet;

    fn choice_question() -> Question {
        Question::multiple_choice(
            "mc",
            "Frequency?",
            [("a", "Daily"), ("b", "Weekly"), ("c", "Never")],
            "b",
        )
        .unwrap()
    }

    #[test]
    fn multiple_choice_matches_correct_key() {
        let q = choice_question();
        assert!(is_correct(&q, Some(&Answer::choice("b"))));
        assert!(!is_correct(&q, Some(&Answer::choice("a"))));
        assert!(!is_correct(&q, Some(&Answer::choice("z"))));
        assert!(!is_correct(&q, Some(&Answer::yes())));
        assert!(!is_correct(&q, None));
    }

    #[test]
    fn multiple_choice_trap_uses_correct_key() {
        let q = choice_question().into_trap();
        assert!(is_correct(&q, Some(&Answer::choice("b"))));
        assert!(!is_correct(&q, Some(&Answer::no())));
    }

    #[test]
    fn option_keys_that_look_like_replies_match_verbatim() {
        let q = Question::multiple_choice("mc", "Certified?", [("si", "Sí"), ("no", "No")], "si")
            .unwrap();
        let answers: AnswerSet = serde_json::from_str(r#"{"r-0-0": "si", "r-0-1": "no"}"#).unwrap();
        assert!(is_correct(&q, answers.lookup("r", 0, 0, "")));
        assert!(!is_correct(&q, answers.lookup("r", 0, 1, "")));

        let q = Question::multiple_choice("mc", "Certified?", [("Yes", "Yes"), ("No", "No")], "Yes")
            .unwrap();
        assert!(is_correct(&q, Answer::parse(" Yes ").as_ref()));
        assert!(!is_correct(&q, Answer::parse("yes").as_ref()));
        assert!(!is_correct(&q, Answer::parse("si").as_ref()));

        let q = Question::multiple_choice("mc", "Applies?", [("n/a", "N/A"), ("x", "Other")], "n/a")
            .unwrap();
        assert!(is_correct(&q, Answer::parse("n/a").as_ref()));
        assert!(!is_correct(&q, Answer::parse("na").as_ref()));
    }

    #[test]
    fn open_question_accepts_legacy_spellings() {
        let q = Question::open("o", "Do you wear a helmet?");
        for raw in ["yes", "YES", "si", "Sí"] {
            assert!(is_correct(&q, Answer::parse(raw).as_ref()), "{raw}");
        }
        let trap = q.clone().into_trap();
        for raw in ["no", "No"] {
            assert!(is_correct(&trap, Answer::parse(raw).as_ref()), "{raw}");
        }
        assert!(!is_correct(&trap, Answer::parse("N/A").as_ref()));
    }

    #[test]
    fn open_question_expects_yes() {
        let q = Question::open("o", "Do you wear a helmet?");
        assert!(is_correct(&q, Some(&Answer::yes())));
        assert!(!is_correct(&q, Some(&Answer::no())));
        assert!(!is_correct(&q, Some(&Answer::not_applicable())));
        assert!(!is_correct(&q, Some(&Answer::choice("maybe"))));
        assert!(!is_correct(&q, None));
    }

    #[test]
    fn open_trap_expects_no() {
        let q = Question::open("t", "Have you ever skipped a safety check?").into_trap();
        assert!(is_correct(&q, Some(&Answer::no())));
        assert!(!is_correct(&q, Some(&Answer::yes())));
        assert!(!is_correct(&q, Some(&Answer::not_applicable())));
        assert!(!is_correct(&q, None));
    }
}
