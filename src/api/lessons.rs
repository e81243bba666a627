use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{Lesson, User};
use crate::repositories;
use crate::schemas::lesson::{
    LessonDetailResponse, LessonProgressResponse, LessonProgressUpdate,
};
use crate::services::progress;
use crate::services::progress::Prerequisite;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:lesson_id", get(get_lesson))
        .route("/:lesson_id/progress", post(record_progress))
        .route("/:lesson_id/complete", post(complete_lesson))
}

async fn get_lesson(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> Result<Json<LessonDetailResponse>, ApiError> {
    let (lesson, is_unlocked, prerequisite) = load_with_unlock(&state, &user, &lesson_id).await?;

    let record =
        repositories::lesson_progress::find_for_user_lesson(state.db(), &user.id, &lesson.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load lesson progress"))?;

    // Locked lessons keep their metadata visible but the body is withheld,
    // and the response names the lesson to finish first.
    let content = if is_unlocked { Some(lesson.content) } else { None };

    Ok(Json(LessonDetailResponse {
        id: lesson.id,
        course_id: lesson.course_id,
        title: lesson.title,
        content,
        order_index: lesson.order_index,
        is_unlocked,
        is_completed: record.as_ref().map(|r| r.is_completed).unwrap_or(false),
        progress_percentage: record.as_ref().map(|r| r.progress_percentage).unwrap_or(0),
        prerequisite_lesson_id: prerequisite.as_ref().map(|p| p.lesson_id.clone()),
        prerequisite_lesson_title: prerequisite.map(|p| p.title),
    }))
}

async fn record_progress(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
    Json(payload): Json<LessonProgressUpdate>,
) -> Result<Json<LessonProgressResponse>, ApiError> {
    validate_payload(&payload)?;
    let (lesson, is_unlocked, prerequisite) = load_with_unlock(&state, &user, &lesson_id).await?;
    if !is_unlocked {
        return Err(ApiError::Conflict(locked_message(prerequisite.as_ref())));
    }

    let record = repositories::lesson_progress::record_activity(
        state.db(),
        &Uuid::new_v4().to_string(),
        &user.id,
        &lesson.id,
        payload.progress_percentage,
        payload.time_spent_minutes,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record lesson progress"))?;

    Ok(Json(to_progress_response(record)))
}

async fn complete_lesson(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> Result<Json<LessonProgressResponse>, ApiError> {
    let (lesson, is_unlocked, prerequisite) = load_with_unlock(&state, &user, &lesson_id).await?;
    if !is_unlocked {
        return Err(ApiError::Conflict(locked_message(prerequisite.as_ref())));
    }

    let record = repositories::lesson_progress::mark_completed(
        state.db(),
        &Uuid::new_v4().to_string(),
        &user.id,
        &lesson.id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to complete lesson"))?;

    progress::recompute_progress(&state, &user.id, &lesson.course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to recompute course progress"))?;

    Ok(Json(to_progress_response(record)))
}

/// Loads a lesson and evaluates its unlock state from the ordered course
/// lessons. Drafted courses are hidden from non-authors.
async fn load_with_unlock(
    state: &AppState,
    user: &User,
    lesson_id: &str,
) -> Result<(Lesson, bool, Option<Prerequisite>), ApiError> {
    let lesson = repositories::lessons::find_by_id(state.db(), lesson_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load lesson"))?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    let course = repositories::courses::find_by_id(state.db(), &lesson.course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    let is_author = user.is_platform_admin || course.created_by == user.id;
    if !course.is_published && !is_author {
        return Err(ApiError::NotFound("Lesson not found".to_string()));
    }

    // Authors see everything regardless of unlock order.
    if is_author {
        return Ok((lesson, true, None));
    }

    let lessons = repositories::lessons::list_by_course_ordered(state.db(), &lesson.course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list lessons"))?;
    let progress_map =
        repositories::lesson_progress::map_for_user_course(state.db(), &user.id, &lesson.course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load lesson progress"))?;

    let states = progress::compute_unlock_states(lessons, &progress_map);
    let (is_unlocked, prerequisite) = states
        .into_iter()
        .find(|s| s.lesson.id == lesson.id)
        .map(|s| (s.is_unlocked, s.prerequisite))
        .unwrap_or((false, None));

    Ok((lesson, is_unlocked, prerequisite))
}

fn locked_message(prerequisite: Option<&Prerequisite>) -> String {
    match prerequisite {
        Some(p) => format!("Lesson is locked; complete \"{}\" first", p.title),
        None => "Lesson is locked".to_string(),
    }
}

fn to_progress_response(record: crate::db::models::LessonProgress) -> LessonProgressResponse {
    LessonProgressResponse {
        lesson_id: record.lesson_id,
        is_completed: record.is_completed,
        progress_percentage: record.progress_percentage,
        time_spent_minutes: record.time_spent_minutes,
        completed_at: record.completed_at.map(format_primitive),
    }
}
