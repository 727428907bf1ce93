use crate::workflows::interview::domain::Question;

/// Exact-match grading: an answer counts only when it string-equals the
/// question's canonical answer. Blank answers never match; an empty question
/// set grades to zero rather than dividing by zero.
pub fn grade_answers(questions: &[Question], answers: &[Option<String>]) -> f64 {
    if questions.is_empty() {
        return 0.0;
    }

    let correct = questions
        .iter()
        .enumerate()
        .filter(|(index, question)| {
            answers
                .get(*index)
                .and_then(|chosen| chosen.as_deref())
                .is_some_and(|chosen| chosen == question.correct_answer)
        })
        .count();

    100.0 * correct as f64 / questions.len() as f64
}
