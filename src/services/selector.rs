// src/services/selector.rs

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use rand::{Rng, rngs::StdRng, seq::SliceRandom};
use tokio::sync::Mutex;

use crate::{
    error::AppError,
    models::{
        history::{HistoryEntry, Outcome},
        question::Question,
    },
    store::{HistoryStore, QuestionSource},
};

/// Orders candidates by priority and keeps the first `count`.
///
/// Priority: never-seen questions (shuffled), then questions last answered
/// incorrectly, then everything else. Seen groups are ordered by `last_seen`
/// ascending so the stalest resurface first. Duplicate ids are dropped.
pub fn rank_questions<R: Rng + ?Sized>(
    candidates: Vec<Question>,
    history: &HashMap<String, HistoryEntry>,
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mut seen_ids = HashSet::new();
    let mut unseen = Vec::new();
    let mut failed = Vec::new();
    let mut others = Vec::new();

    for question in candidates {
        if !seen_ids.insert(question.id.clone()) {
            continue;
        }
        match history.get(&question.id) {
            None => unseen.push(question),
            Some(entry) if entry.outcome == Outcome::Incorrect => {
                failed.push((entry.last_seen, question))
            }
            Some(entry) => others.push((entry.last_seen, question)),
        }
    }

    unseen.shuffle(rng);
    // Stable sort keeps candidate order among equal timestamps
    failed.sort_by_key(|(last_seen, _)| *last_seen);
    others.sort_by_key(|(last_seen, _)| *last_seen);

    unseen
        .into_iter()
        .chain(failed.into_iter().map(|(_, q)| q))
        .chain(others.into_iter().map(|(_, q)| q))
        .take(count)
        .collect()
}

/// Picks questions for a theme set using the user's answer history.
pub struct QuestionSelector {
    questions: Arc<dyn QuestionSource>,
    history: Arc<dyn HistoryStore>,
    rng: Mutex<StdRng>,
}

impl QuestionSelector {
    pub fn new(
        questions: Arc<dyn QuestionSource>,
        history: Arc<dyn HistoryStore>,
        rng: StdRng,
    ) -> Self {
        Self {
            questions,
            history,
            rng: Mutex::new(rng),
        }
    }

    /// Returns up to `count` questions; fewer when the themes run dry.
    pub async fn select(
        &self,
        theme_ids: &[String],
        count: usize,
        user_id: &str,
    ) -> Result<Vec<Question>, AppError> {
        let candidates = self.questions.list_by_themes(theme_ids).await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let history = self
            .history
            .get_history_for_user_and_themes(user_id, theme_ids)
            .await?;

        tracing::debug!(
            "Selecting {} of {} candidates ({} with history) for user {}",
            count,
            candidates.len(),
            history.len(),
            user_id
        );

        let mut rng = self.rng.lock().await;
        Ok(rank_questions(candidates, &history, count, &mut *rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::question::Difficulty, store::memory::MemoryStore};
    use chrono::{Duration, Utc};
    use rand::SeedableRng;

    fn question(id: &str) -> Question {
        Question {
            id: id.to_string(),
            theme_id: "t1".to_string(),
            text: format!("Question {}", id),
            choices: vec!["A".into(), "B".into()],
            correct_answer: 0,
            difficulty: Difficulty::Medium,
            tags: vec![],
        }
    }

    fn entry(question_id: &str, outcome: Outcome, minutes_ago: i64) -> HistoryEntry {
        HistoryEntry {
            user_id: "u1".into(),
            question_id: question_id.into(),
            theme_id: "t1".into(),
            outcome,
            last_seen: Utc::now() - Duration::minutes(minutes_ago),
            times_answered: 1,
        }
    }

    fn ids(questions: &[Question]) -> Vec<&str> {
        questions.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn test_unseen_then_failed_then_others() {
        let candidates = vec![question("ok"), question("new"), question("bad")];
        let mut history = HashMap::new();
        history.insert("bad".to_string(), entry("bad", Outcome::Incorrect, 60));
        history.insert("ok".to_string(), entry("ok", Outcome::Correct, 30));

        let mut rng = StdRng::seed_from_u64(1);
        let ranked = rank_questions(candidates, &history, 3, &mut rng);
        assert_eq!(ids(&ranked), vec!["new", "bad", "ok"]);
    }

    #[test]
    fn test_failed_ranks_before_correct_regardless_of_age() {
        // Incorrect seen recently still beats a correct answer seen long ago.
        let candidates = vec![question("old_ok"), question("recent_bad")];
        let mut history = HashMap::new();
        history.insert("old_ok".to_string(), entry("old_ok", Outcome::Correct, 600));
        history.insert(
            "recent_bad".to_string(),
            entry("recent_bad", Outcome::Incorrect, 1),
        );

        let mut rng = StdRng::seed_from_u64(1);
        let ranked = rank_questions(candidates, &history, 2, &mut rng);
        assert_eq!(ids(&ranked), vec!["recent_bad", "old_ok"]);
    }

    #[test]
    fn test_seen_groups_sorted_oldest_first() {
        let candidates = vec![
            question("f1"),
            question("f2"),
            question("o1"),
            question("o2"),
        ];
        let mut history = HashMap::new();
        history.insert("f1".to_string(), entry("f1", Outcome::Incorrect, 5));
        history.insert("f2".to_string(), entry("f2", Outcome::Incorrect, 50));
        history.insert("o1".to_string(), entry("o1", Outcome::Unanswered, 1));
        history.insert("o2".to_string(), entry("o2", Outcome::Correct, 100));

        let mut rng = StdRng::seed_from_u64(1);
        let ranked = rank_questions(candidates, &history, 10, &mut rng);
        assert_eq!(ids(&ranked), vec!["f2", "f1", "o2", "o1"]);
    }

    #[test]
    fn test_truncation_and_zero_count() {
        let candidates: Vec<_> = (0..5).map(|i| question(&format!("q{}", i))).collect();
        let mut rng = StdRng::seed_from_u64(3);

        let all = rank_questions(candidates.clone(), &HashMap::new(), 50, &mut rng);
        assert_eq!(all.len(), 5);
        let unique: HashSet<_> = all.iter().map(|q| q.id.clone()).collect();
        assert_eq!(unique.len(), 5);

        let none = rank_questions(candidates, &HashMap::new(), 0, &mut rng);
        assert!(none.is_empty());
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let candidates = vec![question("q1"), question("q1"), question("q2")];
        let mut rng = StdRng::seed_from_u64(3);
        let ranked = rank_questions(candidates, &HashMap::new(), 10, &mut rng);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_unseen_order_is_shuffled() {
        let candidates: Vec<_> = (0..10).map(|i| question(&format!("q{}", i))).collect();
        let orders: HashSet<Vec<String>> = (0..20)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                rank_questions(candidates.clone(), &HashMap::new(), 10, &mut rng)
                    .into_iter()
                    .map(|q| q.id)
                    .collect()
            })
            .collect();
        assert!(orders.len() > 1);

        // Same seed, same order.
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(
            rank_questions(candidates.clone(), &HashMap::new(), 10, &mut a),
            rank_questions(candidates, &HashMap::new(), 10, &mut b)
        );
    }

    #[tokio::test]
    async fn test_select_reads_history_for_user_only() {
        let store = Arc::new(MemoryStore::new());
        for id in ["q1", "q2", "q3"] {
            store.put_question(question(id)).await;
        }
        let mut other = question("q4");
        other.theme_id = "t2".into();
        store.put_question(other).await;
        store.insert_history(entry("q1", Outcome::Incorrect, 10)).await;
        store.insert_history(entry("q2", Outcome::Correct, 20)).await;

        let selector = QuestionSelector::new(store.clone(), store.clone(), StdRng::seed_from_u64(9));

        let picked = selector.select(&["t1".to_string()], 3, "u1").await.unwrap();
        assert_eq!(ids(&picked), vec!["q3", "q1", "q2"]);

        // Another user has no history: everything is unseen.
        let picked = selector.select(&["t1".to_string()], 3, "u2").await.unwrap();
        let set: HashSet<_> = picked.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(set, HashSet::from(["q1", "q2", "q3"]));
    }
}
