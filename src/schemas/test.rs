use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Question, Test, TestAttempt, TestAttemptAnswer};
use crate::db::types::{AttemptStatus, QuestionType};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "questionType")]
    pub(crate) question_type: QuestionType,
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub(crate) prompt: String,
    #[serde(default)]
    pub(crate) options: Vec<String>,
    #[serde(default)]
    #[serde(alias = "correctOption")]
    pub(crate) correct_option: Option<i32>,
    #[serde(default)]
    #[serde(alias = "correctText")]
    pub(crate) correct_text: Option<String>,
    #[serde(default = "default_points")]
    #[validate(range(min = 1, message = "points must be positive"))]
    pub(crate) points: i32,
    #[serde(default)]
    pub(crate) solution: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    #[serde(alias = "lessonId")]
    pub(crate) lesson_id: Option<String>,
    #[serde(default = "default_passing_score")]
    #[serde(alias = "passingScore")]
    #[validate(range(min = 0, max = 100, message = "passing_score must be 0-100"))]
    pub(crate) passing_score: i32,
    #[serde(default = "default_max_attempts")]
    #[serde(alias = "maxAttempts")]
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub(crate) max_attempts: i32,
    #[serde(default = "default_duration")]
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionCreate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) lesson_id: Option<String>,
    pub(crate) title: String,
    pub(crate) passing_score: i32,
    pub(crate) max_attempts: i32,
    pub(crate) duration_minutes: i32,
    pub(crate) is_published: bool,
    pub(crate) question_count: i64,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl TestResponse {
    pub(crate) fn from_db(test: Test, question_count: i64) -> Self {
        Self {
            id: test.id,
            course_id: test.course_id,
            lesson_id: test.lesson_id,
            title: test.title,
            passing_score: test.passing_score,
            max_attempts: test.max_attempts,
            duration_minutes: test.duration_minutes,
            is_published: test.is_published,
            question_count,
            created_at: format_primitive(test.created_at),
            updated_at: format_primitive(test.updated_at),
        }
    }
}

/// Question view handed to a student during an attempt. The correct answer
/// and solution are withheld.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionPublicResponse {
    pub(crate) id: String,
    pub(crate) order_index: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) prompt: String,
    pub(crate) options: Vec<String>,
    pub(crate) points: i32,
}

impl QuestionPublicResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            order_index: question.order_index,
            question_type: question.question_type,
            prompt: question.prompt,
            options: question.options.0,
            points: question.points,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerSubmit {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(default)]
    #[serde(alias = "selectedOption")]
    pub(crate) selected_option: Option<i32>,
    #[serde(default)]
    #[serde(alias = "answerText")]
    pub(crate) answer_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) question_id: String,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
}

impl AnswerResponse {
    pub(crate) fn from_db(answer: TestAttemptAnswer) -> Self {
        Self {
            question_id: answer.question_id,
            is_correct: answer.is_correct,
            points_earned: answer.points_earned,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) status: AttemptStatus,
    pub(crate) score: Option<i32>,
    pub(crate) total_questions: i32,
    pub(crate) started_at: String,
    pub(crate) completed_at: Option<String>,
    pub(crate) time_taken_minutes: Option<i32>,
}

impl AttemptResponse {
    pub(crate) fn from_db(attempt: TestAttempt) -> Self {
        Self {
            id: attempt.id,
            test_id: attempt.test_id,
            attempt_number: attempt.attempt_number,
            status: attempt.status,
            score: attempt.score,
            total_questions: attempt.total_questions,
            started_at: format_primitive(attempt.started_at),
            completed_at: attempt.completed_at.map(format_primitive),
            time_taken_minutes: attempt.time_taken_minutes,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StartAttemptResponse {
    pub(crate) attempt: AttemptResponse,
    pub(crate) questions: Vec<QuestionPublicResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) attempt_id: String,
    pub(crate) score: i32,
    pub(crate) correct_answers: i64,
    pub(crate) total_questions: i32,
    pub(crate) time_taken_minutes: i32,
    pub(crate) passed: bool,
}

fn default_points() -> i32 {
    1
}

fn default_passing_score() -> i32 {
    60
}

fn default_max_attempts() -> i32 {
    3
}

fn default_duration() -> i32 {
    30
}
