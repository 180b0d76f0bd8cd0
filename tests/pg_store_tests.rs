// tests/pg_store_tests.rs

use chrono::{SubsecRound, Utc};
use exam_engine::{
    models::{
        attempt::{AnswerMap, Attempt, AttemptUpdate, Patch},
        exam::{Exam, ExamType, QuestionSnapshot},
        history::Outcome,
        score::{AnswerStatus, QuestionResult, ScoreResult},
        theme::ThemeCategory,
    },
    store::{AnalyticsSink, ExamStore, HistoryStore, QuestionSource, ThemeSource, postgres::PgStore},
};
use sqlx::{PgPool, postgres::PgPoolOptions};

/// Connects to the database named by DATABASE_URL and applies migrations.
/// Returns None when no database is configured so the suite can run without one.
async fn connect() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(pool)
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

async fn seed_theme(pool: &PgPool, category: ThemeCategory, questions: usize) -> (String, Vec<String>) {
    let theme_id = unique("theme");
    sqlx::query("INSERT INTO themes (id, code, name, category) VALUES ($1, $2, $3, $4)")
        .bind(&theme_id)
        .bind(unique("code"))
        .bind("Seeded theme")
        .bind(category)
        .execute(pool)
        .await
        .unwrap();

    let mut ids = Vec::new();
    for i in 0..questions {
        let id = unique("question");
        sqlx::query(
            "INSERT INTO questions (id, theme_id, text, choices, correct_answer) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&id)
        .bind(&theme_id)
        .bind(format!("Question {}", i))
        .bind(sqlx::types::Json(vec!["A", "B", "C"]))
        .bind(1_i32)
        .execute(pool)
        .await
        .unwrap();
        ids.push(id);
    }
    (theme_id, ids)
}

fn exam(user_id: &str, theme_id: &str) -> Exam {
    Exam {
        id: unique("exam"),
        exam_type: ExamType::TheoryMixed,
        name: "Mixed".to_string(),
        theme_ids: vec![theme_id.to_string()],
        questions: vec![
            QuestionSnapshot {
                question_id: "q1".to_string(),
                text: "First".to_string(),
                choices: vec!["A".into(), "B".into()],
                correct_answer: 1,
                theme_id: Some(theme_id.to_string()),
            },
            QuestionSnapshot {
                question_id: "q2".to_string(),
                text: "Second".to_string(),
                choices: vec![],
                correct_answer: 0,
                theme_id: None,
            },
        ],
        created_by: user_id.to_string(),
        created_at: Utc::now().trunc_subsecs(6),
    }
}

fn details() -> ScoreResult {
    ScoreResult {
        total_questions: 2,
        correct: 1,
        incorrect: 1,
        unanswered: 0,
        raw_score: 0.75,
        final_score: 26.25,
        scale: 70,
        exam_type: ExamType::TheoryMixed,
        results: vec![QuestionResult {
            question_id: "q1".to_string(),
            question_text: Some("First".to_string()),
            choices: vec!["A".into(), "B".into()],
            theme_id: None,
            selected_answer: Some(1),
            correct_answer: Some(1),
            is_correct: true,
            status: AnswerStatus::Correct,
        }],
    }
}

#[tokio::test]
async fn exam_snapshots_round_trip() {
    let Some(pool) = connect().await else { return };
    let store = PgStore::new(pool.clone());
    let (theme_id, _) = seed_theme(&pool, ThemeCategory::General, 0).await;
    let user_id = unique("user");

    let older = exam(&user_id, &theme_id);
    store.create_exam(&older).await.unwrap();
    let mut newer = exam(&user_id, &theme_id);
    newer.created_at = older.created_at + chrono::Duration::seconds(5);
    store.create_exam(&newer).await.unwrap();

    let loaded = store.get_exam(&older.id).await.unwrap().unwrap();
    assert_eq!(loaded, older);
    assert!(store.get_exam("missing-exam").await.unwrap().is_none());

    let listed = store.list_exams_by_user(&user_id, 10).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
    assert_eq!(store.list_exams_by_user(&user_id, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn attempt_fields_set_and_unset_independently() {
    let Some(pool) = connect().await else { return };
    let store = PgStore::new(pool.clone());
    let (theme_id, _) = seed_theme(&pool, ThemeCategory::General, 0).await;
    let user_id = unique("user");
    let exam = exam(&user_id, &theme_id);
    store.create_exam(&exam).await.unwrap();

    let mut attempt = Attempt::new(&exam.id, &user_id);
    attempt.started_at = attempt.started_at.trunc_subsecs(6);
    store.create_attempt(&attempt).await.unwrap();
    assert_eq!(store.get_attempt(&attempt.id).await.unwrap().unwrap(), attempt);

    assert!(!store
        .update_attempt(&attempt.id, AttemptUpdate::default())
        .await
        .unwrap());
    assert!(!store
        .update_attempt("missing-attempt", AttemptUpdate { score: Patch::Set(1.0), ..Default::default() })
        .await
        .unwrap());

    let answers = AnswerMap::from([("q1".to_string(), 1), ("q2".to_string(), 2)]);
    let finished_at = Utc::now().trunc_subsecs(6);
    let update = AttemptUpdate {
        answers: Patch::Set(answers.clone()),
        finished_at: Patch::Set(finished_at),
        score: Patch::Set(26.25),
        details: Patch::Set(details()),
    };
    assert!(store.update_attempt(&attempt.id, update).await.unwrap());

    let stored = store.get_attempt(&attempt.id).await.unwrap().unwrap();
    assert_eq!(stored.answers, answers);
    assert_eq!(stored.finished_at, Some(finished_at));
    assert_eq!(stored.score, Some(26.25));
    assert_eq!(stored.details, Some(details()));

    // Touching one field leaves the others alone.
    let update = AttemptUpdate {
        score: Patch::Unset,
        details: Patch::Unset,
        ..Default::default()
    };
    assert!(store.update_attempt(&attempt.id, update).await.unwrap());
    let stored = store.get_attempt(&attempt.id).await.unwrap().unwrap();
    assert_eq!(stored.score, None);
    assert_eq!(stored.details, None);
    assert_eq!(stored.answers, answers);
    assert_eq!(stored.finished_at, Some(finished_at));

    let update = AttemptUpdate {
        answers: Patch::Unset,
        finished_at: Patch::Unset,
        ..Default::default()
    };
    assert!(store.update_attempt(&attempt.id, update).await.unwrap());
    let stored = store.get_attempt(&attempt.id).await.unwrap().unwrap();
    assert!(stored.answers.is_empty());
    assert!(!stored.is_finished());

    let listed = store.list_attempts_by_user(&user_id, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, attempt.id);
}

#[tokio::test]
async fn history_upsert_keeps_one_row_per_question() {
    let Some(pool) = connect().await else { return };
    let store = PgStore::new(pool.clone());
    let (theme_id, questions) = seed_theme(&pool, ThemeCategory::Specific, 2).await;
    let user_id = unique("user");

    store
        .upsert_interaction(&user_id, &questions[0], &theme_id, Outcome::Incorrect)
        .await
        .unwrap();
    store
        .upsert_interaction(&user_id, &questions[0], &theme_id, Outcome::Correct)
        .await
        .unwrap();
    store
        .upsert_interaction(&user_id, &questions[1], &theme_id, Outcome::Unanswered)
        .await
        .unwrap();

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM question_history WHERE user_id = $1")
        .bind(&user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 2);

    let history = store
        .get_history_for_user_and_themes(&user_id, &[theme_id.clone()])
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    let first = &history[&questions[0]];
    assert_eq!(first.outcome, Outcome::Correct);
    assert_eq!(first.times_answered, 2);
    assert_eq!(history[&questions[1]].times_answered, 1);

    let other = store
        .get_history_for_user_and_themes(&unique("user"), &[theme_id])
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn question_and_theme_lookups() {
    let Some(pool) = connect().await else { return };
    let store = PgStore::new(pool.clone());
    let (theme_id, questions) = seed_theme(&pool, ThemeCategory::Specific, 3).await;

    let found = store.list_by_themes(&[theme_id.clone()]).await.unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|q| q.theme_id == theme_id && q.correct_answer == 1));

    let question = QuestionSource::get_by_id(&store, &questions[0]).await.unwrap().unwrap();
    assert_eq!(question.choices, vec!["A", "B", "C"]);

    let theme = ThemeSource::get_by_id(&store, &theme_id).await.unwrap().unwrap();
    assert_eq!(theme.category, ThemeCategory::Specific);
    let by_code = store.get_by_code(&theme.code).await.unwrap().unwrap();
    assert_eq!(by_code.id, theme_id);

    let specific = store.list_by_category(ThemeCategory::Specific).await.unwrap();
    assert!(specific.iter().any(|t| t.id == theme_id));
    let general = store.list_by_category(ThemeCategory::General).await.unwrap();
    assert!(general.iter().all(|t| t.id != theme_id));
}

#[tokio::test]
async fn analytics_rows_are_batch_inserted() {
    let Some(pool) = connect().await else { return };
    let store = PgStore::new(pool.clone());
    let attempt_id = unique("attempt");

    let mut results = details().results;
    results.push(QuestionResult {
        question_id: "q2".to_string(),
        status: AnswerStatus::Unanswered,
        ..Default::default()
    });
    store
        .record_attempt_results(&attempt_id, "analytics-user", &results)
        .await
        .unwrap();
    store
        .record_attempt_results(&attempt_id, "analytics-user", &[])
        .await
        .unwrap();

    let rows: Vec<(String, AnswerStatus, bool)> = sqlx::query_as(
        "SELECT question_id, status, is_correct FROM attempt_results WHERE attempt_id = $1 ORDER BY question_id",
    )
    .bind(&attempt_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(
        rows,
        vec![
            ("q1".to_string(), AnswerStatus::Correct, true),
            ("q2".to_string(), AnswerStatus::Unanswered, false),
        ]
    );
}
