use crate::workflows::interview::domain::{HrTurn, Question, QuestionKind};
use crate::workflows::interview::fallback;
use crate::workflows::interview::generator::{
    render_history, validate_problem, validate_questions, GeneratorError,
};

fn question(options: &[&str], answer: &str) -> Question {
    Question {
        kind: QuestionKind::Logical,
        prompt: "Pick one".to_string(),
        options: options.iter().map(|option| option.to_string()).collect(),
        correct_answer: answer.to_string(),
    }
}

#[test]
fn well_formed_requires_four_distinct_options_containing_the_answer() {
    assert!(question(&["a", "b", "c", "d"], "c").is_well_formed());

    // Too few options.
    assert!(!question(&["a", "b"], "a").is_well_formed());
    // Duplicate option.
    assert!(!question(&["a", "a", "b", "c"], "a").is_well_formed());
    // Answer outside the option set.
    assert!(!question(&["a", "b", "c", "d"], "e").is_well_formed());
}

#[test]
fn presented_options_rotate_deterministically() {
    let question = question(&["a", "b", "c", "d"], "a");

    assert_eq!(question.presented_options(0), vec!["a", "b", "c", "d"]);
    assert_eq!(question.presented_options(1), vec!["b", "c", "d", "a"]);
    assert_eq!(question.presented_options(5), vec!["b", "c", "d", "a"]);

    // Same seed, same order: no hidden randomness.
    assert_eq!(question.presented_options(3), question.presented_options(3));
}

#[test]
fn question_validation_rejects_contract_violations() {
    match validate_questions(vec![question(&["a", "b", "c", "d"], "e")]) {
        Err(GeneratorError::Malformed(_)) => {}
        other => panic!("expected malformed error, got {other:?}"),
    }

    match validate_questions(Vec::new()) {
        Err(GeneratorError::Malformed(_)) => {}
        other => panic!("expected malformed error, got {other:?}"),
    }

    let valid = validate_questions(fallback::aptitude_questions()).expect("canned set is valid");
    assert_eq!(valid.len(), 2);
}

#[test]
fn problem_validation_requires_a_marker() {
    let mut problem = fallback::coding_problem();
    problem.expected_marker = "  ".to_string();

    match validate_problem(problem) {
        Err(GeneratorError::Malformed(message)) => {
            assert!(message.contains("marker"));
        }
        other => panic!("expected malformed error, got {other:?}"),
    }

    validate_problem(fallback::coding_problem()).expect("canned problem is valid");
}

#[test]
fn transcript_rendering_labels_each_speaker() {
    let turns = vec![
        HrTurn::interviewer("Tell me about yourself."),
        HrTurn::candidate("I build storage engines."),
    ];

    let rendered = render_history(&turns);
    assert_eq!(
        rendered,
        "Interviewer: Tell me about yourself.\nCandidate: I build storage engines.\n"
    );
}
