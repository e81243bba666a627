use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::EnrollmentStatus;
use crate::repositories;
use crate::test_support;

#[tokio::test]
async fn author_can_create_and_publish_course() {
    let ctx = test_support::setup_test_context().await;

    let author =
        test_support::insert_user(ctx.state.db(), "author01", "Author", "author-pass").await;
    let token = test_support::bearer_token(&author.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/courses",
            Some(&token),
            Some(json!({
                "title": "Rust Basics",
                "description": "An introduction",
                "certification": "Rust Basics Certificate"
            })),
        ))
        .await
        .expect("create course");

    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["is_published"], false);
    let course_id = created["id"].as_str().expect("course id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/courses/{course_id}/publish"),
            Some(&token),
            None,
        ))
        .await
        .expect("publish course");

    let status = response.status();
    let published = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {published}");
    assert_eq!(published["is_published"], true);
}

#[tokio::test]
async fn non_author_cannot_update_course() {
    let ctx = test_support::setup_test_context().await;

    let author =
        test_support::insert_user(ctx.state.db(), "author02", "Author", "author-pass").await;
    let course =
        test_support::insert_published_course(ctx.state.db(), "Locked Course", None, &author.id)
            .await;

    let stranger =
        test_support::insert_user(ctx.state.db(), "stranger02", "Stranger", "stranger-pass").await;
    let token = test_support::bearer_token(&stranger.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/courses/{}", course.id),
            Some(&token),
            Some(json!({ "title": "Hijacked" })),
        ))
        .await
        .expect("update course");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "response: {body}");
}

#[tokio::test]
async fn draft_course_is_hidden_from_students() {
    let ctx = test_support::setup_test_context().await;

    let author =
        test_support::insert_user(ctx.state.db(), "author03", "Author", "author-pass").await;
    let course =
        test_support::insert_course(ctx.state.db(), "Draft Course", None, &author.id).await;

    let student =
        test_support::insert_user(ctx.state.db(), "student03", "Student", "student-pass").await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("get course");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enrollment_is_idempotent_per_course() {
    let ctx = test_support::setup_test_context().await;

    let author =
        test_support::insert_user(ctx.state.db(), "author04", "Author", "author-pass").await;
    let course =
        test_support::insert_published_course(ctx.state.db(), "Enroll Course", None, &author.id)
            .await;

    let student =
        test_support::insert_user(ctx.state.db(), "student04", "Student", "student-pass").await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/courses/{}/enroll", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("enroll");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["status"], "enrolled");
    assert_eq!(body["progress"], 0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/courses/{}/enroll", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("enroll again");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let course = repositories::courses::find_by_id(ctx.state.db(), &course.id)
        .await
        .expect("reload course")
        .expect("course exists");
    assert_eq!(course.student_count, 1);

    let enrollment =
        repositories::enrollments::find_for_user_course(ctx.state.db(), &student.id, &course.id)
            .await
            .expect("load enrollment")
            .expect("enrollment exists");
    assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);
}

#[tokio::test]
async fn lesson_list_reports_unlock_states() {
    let ctx = test_support::setup_test_context().await;

    let author =
        test_support::insert_user(ctx.state.db(), "author05", "Author", "author-pass").await;
    let course =
        test_support::insert_published_course(ctx.state.db(), "Unlock Course", None, &author.id)
            .await;
    let first = test_support::insert_lesson(ctx.state.db(), &course.id, "One", 1).await;
    test_support::insert_lesson(ctx.state.db(), &course.id, "Two", 2).await;
    test_support::insert_lesson(ctx.state.db(), &course.id, "Three", 3).await;

    let student =
        test_support::insert_user(ctx.state.db(), "student05", "Student", "student-pass").await;
    test_support::enroll_in_course(ctx.state.db(), &student.id, &course.id).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}/lessons", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("list lessons");

    let body = test_support::read_json(response).await;
    let items = body.as_array().expect("lesson array");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["is_unlocked"], true);
    assert_eq!(items[1]["is_unlocked"], false);
    assert_eq!(items[2]["is_unlocked"], false);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/lessons/{}/complete", first.id),
            Some(&token),
            None,
        ))
        .await
        .expect("complete lesson");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}/lessons", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("list lessons again");

    let body = test_support::read_json(response).await;
    let items = body.as_array().expect("lesson array");
    assert_eq!(items[0]["is_completed"], true);
    assert_eq!(items[1]["is_unlocked"], true);
    assert_eq!(items[2]["is_unlocked"], false);
}

#[tokio::test]
async fn locked_lesson_withholds_content() {
    let ctx = test_support::setup_test_context().await;

    let author =
        test_support::insert_user(ctx.state.db(), "author06", "Author", "author-pass").await;
    let course =
        test_support::insert_published_course(ctx.state.db(), "Locked Lessons", None, &author.id)
            .await;
    let first = test_support::insert_lesson(ctx.state.db(), &course.id, "One", 1).await;
    let second = test_support::insert_lesson(ctx.state.db(), &course.id, "Two", 2).await;

    let student =
        test_support::insert_user(ctx.state.db(), "student06", "Student", "student-pass").await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/lessons/{}", second.id),
            Some(&token),
            None,
        ))
        .await
        .expect("get locked lesson");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["is_unlocked"], false);
    assert!(body["content"].is_null());
    // The locked signal names the lesson blocking the way.
    assert_eq!(body["prerequisite_lesson_id"], first.id.as_str());
    assert_eq!(body["prerequisite_lesson_title"], "One");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/lessons/{}/complete", second.id),
            Some(&token),
            None,
        ))
        .await
        .expect("complete locked lesson");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
    assert!(
        body["detail"].as_str().expect("detail").contains("One"),
        "response: {body}"
    );
}

#[tokio::test]
async fn duplicate_lesson_order_is_rejected() {
    let ctx = test_support::setup_test_context().await;

    let author =
        test_support::insert_user(ctx.state.db(), "author07", "Author", "author-pass").await;
    let course =
        test_support::insert_published_course(ctx.state.db(), "Order Course", None, &author.id)
            .await;
    test_support::insert_lesson(ctx.state.db(), &course.id, "One", 1).await;
    let token = test_support::bearer_token(&author.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/courses/{}/lessons", course.id),
            Some(&token),
            Some(json!({ "title": "Another One", "content": "x", "order_index": 1 })),
        ))
        .await
        .expect("create duplicate lesson");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
}
