use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Lesson;
use crate::services::progress::UnlockState;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LessonCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) content: String,
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 1, message = "order_index must be positive"))]
    pub(crate) order_index: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LessonProgressUpdate {
    #[serde(default)]
    #[serde(alias = "progressPercentage")]
    #[validate(range(min = 0, max = 100, message = "progress_percentage must be 0-100"))]
    pub(crate) progress_percentage: i32,
    #[serde(default)]
    #[serde(alias = "timeSpentMinutes")]
    #[validate(range(min = 0, message = "time_spent_minutes must be non-negative"))]
    pub(crate) time_spent_minutes: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) order_index: i32,
    pub(crate) is_published: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl LessonResponse {
    pub(crate) fn from_db(lesson: Lesson) -> Self {
        Self {
            id: lesson.id,
            course_id: lesson.course_id,
            title: lesson.title,
            content: lesson.content,
            order_index: lesson.order_index,
            is_published: lesson.is_published,
            created_at: format_primitive(lesson.created_at),
            updated_at: format_primitive(lesson.updated_at),
        }
    }
}

/// List entry carrying the computed unlock state. Locked lessons keep their
/// metadata but the content body is withheld.
#[derive(Debug, Serialize)]
pub(crate) struct LessonListItem {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) order_index: i32,
    pub(crate) is_unlocked: bool,
    pub(crate) is_completed: bool,
    pub(crate) progress_percentage: i32,
}

impl LessonListItem {
    pub(crate) fn from_state(state: &UnlockState) -> Self {
        Self {
            id: state.lesson.id.clone(),
            course_id: state.lesson.course_id.clone(),
            title: state.lesson.title.clone(),
            order_index: state.lesson.order_index,
            is_unlocked: state.is_unlocked,
            is_completed: state.is_completed,
            progress_percentage: state.progress_percentage,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonDetailResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) content: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) is_unlocked: bool,
    pub(crate) is_completed: bool,
    pub(crate) progress_percentage: i32,
    // Which lesson stands in the way, present while this one is locked.
    pub(crate) prerequisite_lesson_id: Option<String>,
    pub(crate) prerequisite_lesson_title: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonProgressResponse {
    pub(crate) lesson_id: String,
    pub(crate) is_completed: bool,
    pub(crate) progress_percentage: i32,
    pub(crate) time_spent_minutes: i32,
    pub(crate) completed_at: Option<String>,
}
