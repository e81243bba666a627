use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_course_author, CurrentUser};
use crate::api::validation::{validate_payload, validate_question};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::course::{CourseCreate, CourseResponse, CourseUpdate};
use crate::schemas::enrollment::EnrollmentResponse;
use crate::schemas::lesson::{LessonCreate, LessonListItem, LessonResponse};
use crate::schemas::test::{TestCreate, TestResponse};
use crate::services::progress;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route(
            "/:course_id",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route("/:course_id/publish", post(publish_course))
        .route("/:course_id/enroll", post(enroll))
        .route("/:course_id/lessons", get(list_lessons).post(create_lesson))
        .route("/:course_id/tests", get(list_tests).post(create_test))
}

async fn create_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    validate_payload(&payload)?;

    let now = primitive_now_utc();
    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            title: &payload.title,
            description: payload.description.as_deref(),
            certification: payload.certification.as_deref(),
            is_published: false,
            created_by: &user.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create course"))?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course))))
}

async fn list_courses(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list_published(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;
    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

async fn get_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    // Drafts are visible only to the author and admins.
    if !course.is_published && !user.is_platform_admin && course.created_by != user.id {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    Ok(Json(CourseResponse::from_db(course)))
}

async fn update_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<CourseUpdate>,
) -> Result<Json<CourseResponse>, ApiError> {
    validate_payload(&payload)?;
    require_course_author(&state, &user, &course_id).await?;

    repositories::courses::update(
        state.db(),
        &course_id,
        repositories::courses::UpdateCourse {
            title: payload.title,
            description: payload.description,
            certification: payload.certification,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update course"))?;

    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    Ok(Json(CourseResponse::from_db(course)))
}

async fn publish_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    require_course_author(&state, &user, &course_id).await?;

    repositories::courses::set_published(state.db(), &course_id, true, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to publish course"))?;

    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    Ok(Json(CourseResponse::from_db(course)))
}

async fn delete_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_course_author(&state, &user, &course_id).await?;

    let deleted = repositories::courses::soft_delete(state.db(), &course_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete course"))?;
    if !deleted {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn enroll(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;
    if !course.is_published {
        return Err(ApiError::BadRequest("Course is not published".to_string()));
    }

    let created = repositories::enrollments::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        &user.id,
        Some(&course_id),
        None,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create enrollment"))?;
    if !created {
        return Err(ApiError::Conflict("Already enrolled in this course".to_string()));
    }

    repositories::courses::increment_student_count(state.db(), &course_id, 1)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update student count"))?;

    let enrollment =
        repositories::enrollments::find_for_user_course(state.db(), &user.id, &course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load enrollment"))?
            .ok_or_else(|| ApiError::internal("missing row", "Failed to load enrollment"))?;

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from_db(enrollment))))
}

async fn create_lesson(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<LessonCreate>,
) -> Result<(StatusCode, Json<LessonResponse>), ApiError> {
    validate_payload(&payload)?;
    require_course_author(&state, &user, &course_id).await?;

    let existing =
        repositories::lessons::find_by_course_and_order(state.db(), &course_id, payload.order_index)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check lesson order"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(format!(
            "Lesson with order_index {} already exists",
            payload.order_index
        )));
    }

    let now = primitive_now_utc();
    let lesson = repositories::lessons::create(
        state.db(),
        repositories::lessons::CreateLesson {
            id: &Uuid::new_v4().to_string(),
            course_id: &course_id,
            title: &payload.title,
            content: &payload.content,
            order_index: payload.order_index,
            is_published: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create lesson"))?;

    Ok((StatusCode::CREATED, Json(LessonResponse::from_db(lesson))))
}

async fn list_lessons(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<LessonListItem>>, ApiError> {
    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;
    if !course.is_published && !user.is_platform_admin && course.created_by != user.id {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    let lessons = repositories::lessons::list_by_course_ordered(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list lessons"))?;
    let progress_map =
        repositories::lesson_progress::map_for_user_course(state.db(), &user.id, &course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load lesson progress"))?;

    let states = progress::compute_unlock_states(lessons, &progress_map);
    Ok(Json(states.iter().map(LessonListItem::from_state).collect()))
}

async fn create_test(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<TestCreate>,
) -> Result<(StatusCode, Json<TestResponse>), ApiError> {
    validate_payload(&payload)?;
    for question in &payload.questions {
        validate_question(question)?;
    }
    require_course_author(&state, &user, &course_id).await?;

    if let Some(lesson_id) = &payload.lesson_id {
        let lesson = repositories::lessons::find_by_id(state.db(), lesson_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load lesson"))?
            .filter(|l| l.course_id == course_id)
            .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

        let attached = repositories::tests::find_by_lesson(state.db(), &lesson.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check lesson test"))?;
        if attached.is_some() {
            return Err(ApiError::Conflict("Lesson already has a test".to_string()));
        }
    }

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to open transaction"))?;

    let test = repositories::tests::create(
        &mut *tx,
        repositories::tests::CreateTest {
            id: &Uuid::new_v4().to_string(),
            course_id: &course_id,
            lesson_id: payload.lesson_id.as_deref(),
            title: &payload.title,
            passing_score: payload.passing_score,
            max_attempts: payload.max_attempts,
            duration_minutes: payload.duration_minutes,
            is_published: false,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create test"))?;

    for (index, question) in payload.questions.iter().enumerate() {
        repositories::questions::create(
            &mut *tx,
            repositories::questions::CreateQuestion {
                id: &Uuid::new_v4().to_string(),
                test_id: &test.id,
                order_index: (index + 1) as i32,
                question_type: question.question_type,
                prompt: &question.prompt,
                options: question.options.clone(),
                correct_option: question.correct_option,
                correct_text: question.correct_text.as_deref(),
                points: question.points,
                solution: question.solution.as_deref(),
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create question"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit test"))?;

    let question_count = payload.questions.len() as i64;
    Ok((StatusCode::CREATED, Json(TestResponse::from_db(test, question_count))))
}

async fn list_tests(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<TestResponse>>, ApiError> {
    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let is_author = user.is_platform_admin || course.created_by == user.id;
    if !course.is_published && !is_author {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    let tests = repositories::tests::list_by_course(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list tests"))?;

    let mut responses = Vec::with_capacity(tests.len());
    for test in tests {
        if !test.is_published && !is_author {
            continue;
        }
        let question_count = repositories::questions::count_by_test(state.db(), &test.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
        responses.push(TestResponse::from_db(test, question_count));
    }

    Ok(Json(responses))
}

#[cfg(test)]
mod tests;
