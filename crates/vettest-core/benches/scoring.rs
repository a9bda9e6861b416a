use criterion::{black_box, criterion_group, criterion_main, Criterion};

use vettest_core::classifier::is_correct;
use vettest_core::sampling::{sample_catalog, QuestionBank, SamplingPlan};
use vettest_core::{evaluate, Answer, AnswerKey, AnswerSet, ApprovalPolicy, Question, Section};

const ROLE: &str = "jefe_planta";

fn make_sections(sections: usize, questions: usize) -> Vec<Section> {
    let weight = 100.0 / sections as f64;
    (0..sections)
        .map(|s| {
            let mut qs: Vec<Question> = (0..questions)
                .map(|q| Question::open(format!("s{s}-q{q}"), "bench"))
                .collect();
            qs.push(Question::open(format!("s{s}-trap"), "bench").into_trap());
            Section::new(format!("Section {s}"), weight, qs)
        })
        .collect()
}

fn make_answers(sections: &[Section]) -> AnswerSet {
    sections
        .iter()
        .enumerate()
        .flat_map(|(s, section)| {
            section.questions.iter().enumerate().map(move |(q, question)| {
                let answer = if question.is_trap || q % 7 == 0 {
                    Answer::no()
                } else {
                    Answer::yes()
                };
                (AnswerKey::position(ROLE, s, q), answer)
            })
        })
        .collect()
}

fn bench_classifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier");
    let open = Question::open("o", "bench");
    let choice =
        Question::multiple_choice("m", "bench", [("a", "A"), ("b", "B"), ("c", "C")], "b")
            .expect("valid question");

    group.bench_function("open", |b| {
        b.iter(|| is_correct(black_box(&open), black_box(Some(&Answer::yes()))))
    });

    group.bench_function("multiple_choice", |b| {
        let answer = Answer::choice("b");
        b.iter(|| is_correct(black_box(&choice), black_box(Some(&answer))))
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let policy = ApprovalPolicy::default();

    for (sections, questions) in [(4, 5), (10, 20), (20, 50)] {
        let catalog = make_sections(sections, questions);
        let answers = make_answers(&catalog);
        group.bench_function(format!("{sections}x{questions}"), |b| {
            b.iter(|| {
                evaluate(
                    black_box(&catalog),
                    ROLE,
                    black_box(&answers),
                    black_box(&policy),
                )
            })
        });
    }

    group.finish();
}

fn bench_sample(c: &mut Criterion) {
    let bank = QuestionBank {
        id: "bench".into(),
        title: String::new(),
        role: ROLE.into(),
        kind: "personal".into(),
        sections: make_sections(8, 40),
        traps: (0..50)
            .map(|i| Question::open(format!("t{i}"), "bench"))
            .collect(),
    };
    let plan = SamplingPlan::default();

    c.bench_function("sample_catalog", |b| {
        b.iter(|| sample_catalog(black_box(&bank), black_box(&plan), black_box(42)))
    });
}

criterion_group!(benches, bench_classifier, bench_evaluate, bench_sample);
criterion_main!(benches);
