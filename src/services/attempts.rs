use thiserror::Error;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::{minutes_between, primitive_now_utc};
use crate::db::models::{Question, TestAttempt, TestAttemptAnswer};
use crate::db::types::AttemptStatus;
use crate::repositories;
use crate::repositories::answers::CreateAnswer;
use crate::repositories::attempts::CreateAttempt;
use crate::services::{grading, progress};

#[derive(Debug, Error)]
pub(crate) enum AttemptError {
    #[error("test not found")]
    TestNotFound,
    #[error("test is not published")]
    TestNotPublished,
    #[error("test has no questions")]
    NoQuestions,
    #[error("maximum number of attempts reached")]
    MaxAttemptsReached,
    #[error("an attempt is already in progress")]
    AttemptInProgress,
    #[error("attempt not found")]
    AttemptNotFound,
    #[error("attempt is not in progress")]
    NotInProgress,
    #[error("question not found in this test")]
    QuestionNotFound,
    #[error("question already answered")]
    AlreadyAnswered,
    #[error("{0}")]
    InvalidAnswer(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub(crate) struct SubmitOutcome {
    pub(crate) attempt: TestAttempt,
    pub(crate) score: i32,
    pub(crate) correct_answers: i64,
    pub(crate) time_taken_minutes: i32,
    pub(crate) passed: bool,
}

/// Opens a new attempt. The advisory lock serializes the count-then-insert
/// per (test, user); the partial unique index backstops concurrent starts
/// from other connections.
pub(crate) async fn start_attempt(
    state: &AppState,
    user_id: &str,
    test_id: &str,
) -> Result<(TestAttempt, Vec<Question>), AttemptError> {
    let test = repositories::tests::find_by_id(state.db(), test_id)
        .await?
        .ok_or(AttemptError::TestNotFound)?;
    if !test.is_published {
        return Err(AttemptError::TestNotPublished);
    }

    let mut tx = state.db().begin().await?;
    repositories::attempts::acquire_test_user_lock(&mut *tx, test_id, user_id).await?;

    let question_count = repositories::questions::count_by_test(&mut *tx, test_id).await?;
    if question_count == 0 {
        return Err(AttemptError::NoQuestions);
    }

    if repositories::attempts::find_in_progress(&mut *tx, test_id, user_id).await?.is_some() {
        return Err(AttemptError::AttemptInProgress);
    }

    let prior_attempts =
        repositories::attempts::count_by_test_and_user(&mut *tx, test_id, user_id).await?;
    if prior_attempts >= test.max_attempts as i64 {
        return Err(AttemptError::MaxAttemptsReached);
    }

    let id = Uuid::new_v4().to_string();
    let created = repositories::attempts::create(
        &mut *tx,
        CreateAttempt {
            id: &id,
            test_id,
            user_id,
            attempt_number: (prior_attempts + 1) as i32,
            total_questions: question_count as i32,
            started_at: primitive_now_utc(),
        },
    )
    .await?;
    if !created {
        return Err(AttemptError::AttemptInProgress);
    }

    let attempt = repositories::attempts::find_by_id(&mut *tx, &id)
        .await?
        .ok_or(AttemptError::AttemptNotFound)?;
    tx.commit().await?;

    let questions = repositories::questions::list_by_test(state.db(), test_id).await?;
    Ok((attempt, questions))
}

/// Grades and stores one answer. Answers are write-once: a resubmission for
/// the same question loses against the unique constraint and the stored
/// answer stands.
pub(crate) async fn answer_question(
    state: &AppState,
    user_id: &str,
    attempt_id: &str,
    question_id: &str,
    selected_option: Option<i32>,
    answer_text: Option<&str>,
) -> Result<TestAttemptAnswer, AttemptError> {
    let attempt = owned_attempt(state, user_id, attempt_id).await?;
    if attempt.status != AttemptStatus::InProgress {
        return Err(AttemptError::NotInProgress);
    }

    let question = repositories::questions::find_by_id(state.db(), question_id)
        .await?
        .filter(|q| q.test_id == attempt.test_id)
        .ok_or(AttemptError::QuestionNotFound)?;

    let graded = grading::grade_answer(&question, selected_option, answer_text)
        .map_err(AttemptError::InvalidAnswer)?;

    let id = Uuid::new_v4().to_string();
    let now = primitive_now_utc();
    let inserted = repositories::answers::create(
        state.db(),
        CreateAnswer {
            id: &id,
            attempt_id,
            question_id,
            selected_option,
            answer_text,
            is_correct: graded.is_correct,
            points_earned: graded.points_earned,
            created_at: now,
        },
    )
    .await?;
    if !inserted {
        return Err(AttemptError::AlreadyAnswered);
    }

    repositories::attempts::touch(state.db(), attempt_id, now).await?;

    Ok(TestAttemptAnswer {
        id,
        attempt_id: attempt_id.to_string(),
        question_id: question_id.to_string(),
        selected_option,
        answer_text: answer_text.map(str::to_string),
        is_correct: graded.is_correct,
        points_earned: graded.points_earned,
        created_at: now,
    })
}

/// Finalizes the attempt: scores it against the total points of every
/// question, marks it completed and recomputes course progress.
pub(crate) async fn submit_attempt(
    state: &AppState,
    user_id: &str,
    attempt_id: &str,
) -> Result<SubmitOutcome, AttemptError> {
    let attempt = owned_attempt(state, user_id, attempt_id).await?;
    if attempt.status != AttemptStatus::InProgress {
        return Err(AttemptError::NotInProgress);
    }

    let test = repositories::tests::find_by_id(state.db(), &attempt.test_id)
        .await?
        .ok_or(AttemptError::TestNotFound)?;

    let points_earned = repositories::answers::sum_points_earned(state.db(), attempt_id).await?;
    let total_points =
        repositories::questions::total_points_by_test(state.db(), &attempt.test_id).await?;
    let score = grading::compute_score(points_earned, total_points);

    let now = primitive_now_utc();
    let time_taken_minutes = minutes_between(attempt.started_at, now).max(0);

    let completed =
        repositories::attempts::complete(state.db(), attempt_id, score, time_taken_minutes, now)
            .await?;
    if !completed {
        // Lost a race with another submit or the abandon sweep.
        return Err(AttemptError::NotInProgress);
    }

    let correct_answers = repositories::answers::count_correct(state.db(), attempt_id).await?;
    let attempt = repositories::attempts::fetch_one_by_id(state.db(), attempt_id).await?;

    // Passing a lesson-attached test is what completes the lesson and
    // unlocks the next one.
    let passed = score >= test.passing_score;
    if passed {
        if let Some(lesson_id) = test.lesson_id.as_deref() {
            repositories::lesson_progress::mark_completed(
                state.db(),
                &Uuid::new_v4().to_string(),
                user_id,
                lesson_id,
                now,
            )
            .await?;
        }
    }

    progress::recompute_progress(state, user_id, &test.course_id).await?;

    Ok(SubmitOutcome { passed, attempt, score, correct_answers, time_taken_minutes })
}

pub(crate) async fn get_attempt(
    state: &AppState,
    user_id: &str,
    attempt_id: &str,
) -> Result<(TestAttempt, Vec<TestAttemptAnswer>), AttemptError> {
    let attempt = owned_attempt(state, user_id, attempt_id).await?;
    let answers = repositories::answers::list_by_attempt(state.db(), attempt_id).await?;
    Ok((attempt, answers))
}

/// Attempts of other users are indistinguishable from missing ones.
async fn owned_attempt(
    state: &AppState,
    user_id: &str,
    attempt_id: &str,
) -> Result<TestAttempt, AttemptError> {
    repositories::attempts::find_by_id(state.db(), attempt_id)
        .await?
        .filter(|a| a.user_id == user_id)
        .ok_or(AttemptError::AttemptNotFound)
}
