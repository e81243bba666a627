use std::collections::HashMap;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Lesson, LessonProgress};
use crate::db::types::EnrollmentStatus;
use crate::repositories;
use crate::services::certificates;

#[derive(Debug)]
pub(crate) struct UnlockState {
    pub(crate) lesson: Lesson,
    pub(crate) is_unlocked: bool,
    pub(crate) is_completed: bool,
    pub(crate) progress_percentage: i32,
    /// The lesson standing in the way, set whenever this one is locked.
    pub(crate) prerequisite: Option<Prerequisite>,
}

#[derive(Debug, Clone)]
pub(crate) struct Prerequisite {
    pub(crate) lesson_id: String,
    pub(crate) title: String,
}

/// Left-fold over lessons ordered by `order_index`. The lesson at index 1 is
/// always unlocked; every later one unlocks only when the lesson directly
/// before it (contiguous order index) is itself unlocked and completed, so a
/// lesson completed out of order never unlocks its successor. A missing
/// progress row counts as not completed and a gap in the order indexes keeps
/// everything behind it locked.
pub(crate) fn compute_unlock_states(
    lessons: Vec<Lesson>,
    progress: &HashMap<String, LessonProgress>,
) -> Vec<UnlockState> {
    let mut states: Vec<UnlockState> = Vec::with_capacity(lessons.len());

    for lesson in lessons {
        let record = progress.get(&lesson.id);
        let is_completed = record.map(|p| p.is_completed).unwrap_or(false);
        let progress_percentage = record.map(|p| p.progress_percentage).unwrap_or(0);

        let (is_unlocked, prerequisite) = match states.last() {
            None => (lesson.order_index == 1, None),
            Some(previous) => {
                let contiguous = lesson.order_index == previous.lesson.order_index + 1;
                if contiguous && previous.is_unlocked && previous.is_completed {
                    (true, None)
                } else {
                    let blocker = Prerequisite {
                        lesson_id: previous.lesson.id.clone(),
                        title: previous.lesson.title.clone(),
                    };
                    (false, Some(blocker))
                }
            }
        };

        states.push(UnlockState {
            is_unlocked,
            is_completed,
            progress_percentage,
            prerequisite,
            lesson,
        });
    }

    states
}

/// 50/50 weighting between completed lessons and passed tests. A component
/// contributes 0 when its denominator is 0.
pub(crate) fn compute_progress_percent(
    completed_lessons: i64,
    total_lessons: i64,
    passed_tests: i64,
    total_tests: i64,
) -> i32 {
    let lesson_part = if total_lessons > 0 {
        completed_lessons as f64 / total_lessons as f64 * 50.0
    } else {
        0.0
    };
    let test_part = if total_tests > 0 {
        passed_tests as f64 / total_tests as f64 * 50.0
    } else {
        0.0
    };
    (lesson_part + test_part).round() as i32
}

/// Recomputes and persists course progress for one enrollment. The first
/// transition to 100 marks the enrollment completed and hands off to the
/// certificate engine; a failed award is logged and never propagated.
pub(crate) async fn recompute_progress(
    state: &AppState,
    user_id: &str,
    course_id: &str,
) -> Result<(), sqlx::Error> {
    let Some(enrollment) =
        repositories::enrollments::find_for_user_course(state.db(), user_id, course_id).await?
    else {
        return Ok(());
    };
    // A dropped enrollment stays dropped; late activity never resurrects it.
    if enrollment.status == EnrollmentStatus::Dropped {
        return Ok(());
    }

    let total_lessons =
        repositories::lessons::count_published_by_course(state.db(), course_id).await?;
    let completed_lessons =
        repositories::lesson_progress::count_completed_for_course(state.db(), user_id, course_id)
            .await?;
    let total_tests = repositories::tests::count_published_by_course(state.db(), course_id).await?;
    let passed_tests =
        repositories::tests::count_passed_for_user(state.db(), user_id, course_id).await?;

    let progress =
        compute_progress_percent(completed_lessons, total_lessons, passed_tests, total_tests);

    let now = primitive_now_utc();
    let newly_completed = progress >= 100 && enrollment.status != EnrollmentStatus::Completed;
    let (status, completed_at) = if newly_completed {
        (EnrollmentStatus::Completed, Some(now))
    } else if progress > 0 && enrollment.status == EnrollmentStatus::Enrolled {
        (EnrollmentStatus::InProgress, None)
    } else {
        (enrollment.status, None)
    };

    repositories::enrollments::update_progress(
        state.db(),
        &enrollment.id,
        progress,
        status,
        completed_at,
        now,
    )
    .await?;

    if newly_completed {
        if let Err(err) = certificates::check_and_award_for_course(state, user_id, course_id).await
        {
            tracing::error!(
                user_id,
                course_id,
                error = %format!("{err:#}"),
                "certificate award failed after course completion"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month, PrimitiveDateTime, Time};

    fn lesson(id: &str, order_index: i32) -> Lesson {
        let date = Date::from_calendar_date(2025, Month::May, 1).unwrap();
        let ts = PrimitiveDateTime::new(date, Time::from_hms(9, 0, 0).unwrap());
        Lesson {
            id: id.to_string(),
            course_id: "course-1".to_string(),
            title: format!("Lesson {order_index}"),
            content: String::new(),
            order_index,
            is_published: true,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn completed(lesson_id: &str) -> LessonProgress {
        let date = Date::from_calendar_date(2025, Month::May, 2).unwrap();
        let ts = PrimitiveDateTime::new(date, Time::from_hms(9, 0, 0).unwrap());
        LessonProgress {
            id: format!("lp-{lesson_id}"),
            user_id: "user-1".to_string(),
            lesson_id: lesson_id.to_string(),
            is_completed: true,
            progress_percentage: 100,
            time_spent_minutes: 10,
            completed_at: Some(ts),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn first_lesson_is_always_unlocked() {
        let states = compute_unlock_states(vec![lesson("a", 1), lesson("b", 2)], &HashMap::new());
        assert!(states[0].is_unlocked);
        assert!(!states[1].is_unlocked);
    }

    #[test]
    fn completing_a_lesson_unlocks_the_next_one_only() {
        let mut progress = HashMap::new();
        progress.insert("a".to_string(), completed("a"));

        let states = compute_unlock_states(
            vec![lesson("a", 1), lesson("b", 2), lesson("c", 3)],
            &progress,
        );
        assert!(states[0].is_unlocked && states[0].is_completed);
        assert!(states[1].is_unlocked && !states[1].is_completed);
        assert!(!states[2].is_unlocked);
    }

    #[test]
    fn a_gap_keeps_later_lessons_locked() {
        // Completing lesson 2 without lesson 1 must not unlock lesson 3:
        // lesson 2 is completed but still locked itself.
        let mut progress = HashMap::new();
        progress.insert("b".to_string(), completed("b"));

        let states = compute_unlock_states(
            vec![lesson("a", 1), lesson("b", 2), lesson("c", 3)],
            &progress,
        );
        assert!(states[0].is_unlocked);
        assert!(!states[1].is_unlocked && states[1].is_completed);
        assert!(!states[2].is_unlocked);
    }

    #[test]
    fn locked_lessons_name_their_prerequisite() {
        let states = compute_unlock_states(vec![lesson("a", 1), lesson("b", 2)], &HashMap::new());
        assert!(states[0].prerequisite.is_none());

        let blocker = states[1].prerequisite.as_ref().expect("prerequisite");
        assert_eq!(blocker.lesson_id, "a");
        assert_eq!(blocker.title, "Lesson 1");
    }

    #[test]
    fn an_order_index_gap_locks_the_successor() {
        // Lessons 1 and 3 with no lesson 2: completing lesson 1 is not enough.
        let mut progress = HashMap::new();
        progress.insert("a".to_string(), completed("a"));

        let states = compute_unlock_states(vec![lesson("a", 1), lesson("c", 3)], &progress);
        assert!(states[0].is_unlocked);
        assert!(!states[1].is_unlocked);
    }

    #[test]
    fn empty_course_has_no_states() {
        assert!(compute_unlock_states(Vec::new(), &HashMap::new()).is_empty());
    }

    #[test]
    fn progress_weights_lessons_and_tests_equally() {
        assert_eq!(compute_progress_percent(0, 4, 0, 2), 0);
        assert_eq!(compute_progress_percent(2, 4, 0, 2), 25);
        assert_eq!(compute_progress_percent(4, 4, 1, 2), 75);
        assert_eq!(compute_progress_percent(4, 4, 2, 2), 100);
    }

    #[test]
    fn empty_denominators_contribute_zero() {
        assert_eq!(compute_progress_percent(0, 0, 2, 2), 50);
        assert_eq!(compute_progress_percent(3, 3, 0, 0), 50);
        assert_eq!(compute_progress_percent(0, 0, 0, 0), 0);
    }

    #[test]
    fn progress_rounds_to_nearest() {
        // 1/3 lessons -> 16.666 -> 17.
        assert_eq!(compute_progress_percent(1, 3, 0, 0), 17);
    }
}
