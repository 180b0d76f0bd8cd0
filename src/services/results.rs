// src/services/results.rs

use std::{collections::HashMap, sync::Arc};

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, AttemptUpdate, Patch},
        exam::{Exam, QuestionSnapshot},
        score::{QuestionResult, ScoreResult},
    },
    services::scoring::score_attempt,
    store::ExamStore,
};

/// Fills the display fields a stored result is missing from the exam snapshot.
/// Values already present on the stored result always win, so a persisted
/// correctness judgment is never recomputed.
pub fn merge_result(result: QuestionResult, snapshot: Option<&QuestionSnapshot>) -> QuestionResult {
    let Some(snapshot) = snapshot else {
        return result;
    };

    let question_text = result
        .question_text
        .filter(|t| !t.is_empty())
        .or_else(|| Some(snapshot.text.clone()));
    let choices = if result.choices.is_empty() {
        snapshot.choices.clone()
    } else {
        result.choices
    };
    let correct_answer = result.correct_answer.or(Some(snapshot.correct_answer));

    QuestionResult {
        question_text,
        choices,
        correct_answer,
        ..result
    }
}

/// Re-merges every stored result line with the exam's snapshot for that question.
pub fn enrich_details(details: ScoreResult, exam: &Exam) -> ScoreResult {
    if details.results.is_empty() {
        return details;
    }

    let lookup: HashMap<&str, &QuestionSnapshot> = exam
        .questions
        .iter()
        .map(|q| (q.question_id.as_str(), q))
        .collect();

    let mut details = details;
    details.results = details
        .results
        .into_iter()
        .map(|r| {
            let snapshot = lookup.get(r.question_id.as_str()).copied();
            merge_result(r, snapshot)
        })
        .collect();

    details
}

/// Guarantees that reading results of an attempt always yields complete details.
pub struct ResultMaterializer {
    exams: Arc<dyn ExamStore>,
}

impl ResultMaterializer {
    pub fn new(exams: Arc<dyn ExamStore>) -> Self {
        Self { exams }
    }

    /// * Stored details are enriched from the exam and returned; nothing is written.
    /// * Missing details are recomputed and persisted together with the score.
    pub async fn materialize(&self, attempt: &Attempt, exam: &Exam) -> Result<ScoreResult, AppError> {
        if let Some(details) = &attempt.details {
            return Ok(enrich_details(details.clone(), exam));
        }

        let details = score_attempt(&exam.questions, &attempt.answers, exam.exam_type);

        let update = AttemptUpdate {
            score: Patch::Set(details.final_score),
            details: Patch::Set(details.clone()),
            ..Default::default()
        };
        self.exams.update_attempt(&attempt.id, update).await?;
        tracing::info!("Backfilled score details for attempt {}", attempt.id);

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{attempt::AnswerMap, exam::ExamType, score::AnswerStatus},
        store::memory::MemoryStore,
    };
    use chrono::Utc;

    fn exam() -> Exam {
        Exam {
            id: "e1".into(),
            exam_type: ExamType::Theory,
            name: "Exam".into(),
            theme_ids: vec!["t1".into()],
            questions: vec![
                QuestionSnapshot {
                    question_id: "q1".into(),
                    text: "Current text 1".into(),
                    choices: vec!["A".into(), "B".into()],
                    correct_answer: 0,
                    theme_id: Some("t1".into()),
                },
                QuestionSnapshot {
                    question_id: "q2".into(),
                    text: "Current text 2".into(),
                    choices: vec!["C".into(), "D".into()],
                    correct_answer: 1,
                    theme_id: Some("t1".into()),
                },
            ],
            created_by: "u1".into(),
            created_at: Utc::now(),
        }
    }

    fn finished_attempt() -> Attempt {
        let mut attempt = Attempt::new("e1", "u1");
        attempt.answers = AnswerMap::from([("q1".to_string(), 0)]);
        attempt.finished_at = Some(Utc::now());
        attempt
    }

    #[test]
    fn test_merge_fills_missing_fields_only() {
        let exam = exam();
        let legacy = QuestionResult {
            question_id: "q1".into(),
            selected_answer: Some(1),
            is_correct: true,
            status: AnswerStatus::Correct,
            ..Default::default()
        };

        let merged = merge_result(legacy, exam.snapshot("q1"));
        assert_eq!(merged.question_text.as_deref(), Some("Current text 1"));
        assert_eq!(merged.choices, vec!["A", "B"]);
        assert_eq!(merged.correct_answer, Some(0));
        // Stored judgment is kept even though it disagrees with the snapshot.
        assert!(merged.is_correct);
        assert_eq!(merged.status, AnswerStatus::Correct);
    }

    #[test]
    fn test_merge_keeps_stored_values() {
        let exam = exam();
        let stored = QuestionResult {
            question_id: "q2".into(),
            question_text: Some("Old text".into()),
            choices: vec!["X".into()],
            correct_answer: Some(0),
            ..Default::default()
        };

        let merged = merge_result(stored.clone(), exam.snapshot("q2"));
        assert_eq!(merged, stored);

        let orphan = QuestionResult {
            question_id: "gone".into(),
            ..Default::default()
        };
        assert_eq!(merge_result(orphan.clone(), exam.snapshot("gone")), orphan);
    }

    #[test]
    fn test_merge_replaces_blank_text() {
        let exam = exam();
        let blank = QuestionResult {
            question_id: "q2".into(),
            question_text: Some(String::new()),
            ..Default::default()
        };

        let merged = merge_result(blank, exam.snapshot("q2"));
        assert_eq!(merged.question_text.as_deref(), Some("Current text 2"));
        assert_eq!(merged.choices, vec!["C", "D"]);
    }

    #[tokio::test]
    async fn test_backfills_missing_details_once() {
        let store = Arc::new(MemoryStore::new());
        let exam = exam();
        let attempt = finished_attempt();
        store.create_attempt(&attempt).await.unwrap();

        let materializer = ResultMaterializer::new(store.clone());
        let details = materializer.materialize(&attempt, &exam).await.unwrap();
        assert_eq!(details.correct, 1);
        assert_eq!(details.unanswered, 1);
        assert_eq!(store.attempt_writes(), 1);

        let stored = store.get_attempt(&attempt.id).await.unwrap().unwrap();
        assert_eq!(stored.details.as_ref(), Some(&details));
        assert_eq!(stored.score, Some(details.final_score));

        let again = materializer.materialize(&stored, &exam).await.unwrap();
        assert_eq!(again, details);
        assert_eq!(store.attempt_writes(), 1);
    }

    #[tokio::test]
    async fn test_empty_results_returned_as_is() {
        let store = Arc::new(MemoryStore::new());
        let mut attempt = finished_attempt();
        attempt.details = Some(ScoreResult {
            total_questions: 2,
            final_score: 35.0,
            ..Default::default()
        });

        let materializer = ResultMaterializer::new(store.clone());
        let details = materializer.materialize(&attempt, &exam()).await.unwrap();
        assert!(details.results.is_empty());
        assert_eq!(details.final_score, 35.0);
        assert_eq!(store.attempt_writes(), 0);
    }
}
