// src/services/scoring.rs

use crate::models::{
    attempt::AnswerMap,
    exam::{ExamType, QuestionSnapshot},
    score::{AnswerStatus, QuestionResult, ScoreResult},
};

/// Points awarded for a correct answer.
pub const CORRECT_POINTS: f64 = 1.0;
/// Points deducted for an incorrect answer. Unanswered questions cost nothing.
pub const INCORRECT_PENALTY: f64 = -0.25;

/// Rounds to 2 decimals, ties to even (13.125 -> 13.12).
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Scores an attempt against the exam snapshots.
///
/// * Iterates snapshots in exam order; answers for questions outside the exam are ignored.
/// * Raw score = correct - 0.25 * incorrect, floored at 0.
/// * Final score = raw / total * scale, rounded to 2 decimals (0 for an empty exam).
pub fn score_attempt(
    questions: &[QuestionSnapshot],
    answers: &AnswerMap,
    exam_type: ExamType,
) -> ScoreResult {
    let total_questions = questions.len();
    let mut correct = 0;
    let mut incorrect = 0;
    let mut unanswered = 0;

    let results: Vec<QuestionResult> = questions
        .iter()
        .map(|q| {
            let selected = answers.get(&q.question_id).copied();
            let status = match selected {
                None => {
                    unanswered += 1;
                    AnswerStatus::Unanswered
                }
                Some(choice) if choice == q.correct_answer => {
                    correct += 1;
                    AnswerStatus::Correct
                }
                Some(_) => {
                    incorrect += 1;
                    AnswerStatus::Incorrect
                }
            };

            QuestionResult {
                question_id: q.question_id.clone(),
                question_text: Some(q.text.clone()),
                choices: q.choices.clone(),
                theme_id: q.theme_id.clone(),
                selected_answer: selected,
                correct_answer: Some(q.correct_answer),
                is_correct: status == AnswerStatus::Correct,
                status,
            }
        })
        .collect();

    let raw_score =
        (correct as f64 * CORRECT_POINTS + incorrect as f64 * INCORRECT_PENALTY).max(0.0);
    let scale = exam_type.scale();
    let final_score = if total_questions == 0 {
        0.0
    } else {
        round2(raw_score / total_questions as f64 * f64::from(scale))
    };

    ScoreResult {
        total_questions,
        correct,
        incorrect,
        unanswered,
        raw_score,
        final_score,
        scale,
        exam_type,
        results,
    }
}
