use crate::db::models::Question;
use crate::db::types::QuestionType;

#[derive(Debug, Clone, Copy)]
pub(crate) struct GradedAnswer {
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
}

/// Validates answer shape for the question type, then grades it. Returns an
/// error message suitable for a 400 response when the shape is wrong.
pub(crate) fn grade_answer(
    question: &Question,
    selected_option: Option<i32>,
    answer_text: Option<&str>,
) -> Result<GradedAnswer, String> {
    let is_correct = match question.question_type {
        QuestionType::MultipleChoice => {
            let selected = selected_option.ok_or("selected_option is required")?;
            let option_count = question.options.0.len() as i32;
            if selected < 0 || selected >= option_count {
                return Err(format!("selected_option must be in range 0..{option_count}"));
            }
            question.correct_option == Some(selected)
        }
        QuestionType::TrueFalse => {
            let selected = selected_option.ok_or("selected_option is required")?;
            if selected != 0 && selected != 1 {
                return Err("selected_option must be 0 or 1".to_string());
            }
            question.correct_option == Some(selected)
        }
        QuestionType::ShortAnswer => {
            let text = answer_text.ok_or("answer_text is required")?;
            if text.trim().is_empty() {
                return Err("answer_text must not be empty".to_string());
            }
            match question.correct_text.as_deref() {
                Some(expected) => text.trim().eq_ignore_ascii_case(expected.trim()),
                None => false,
            }
        }
    };

    let points_earned = if is_correct { question.points } else { 0 };
    Ok(GradedAnswer { is_correct, points_earned })
}

/// Percentage score over the maximum points of every question in the test,
/// including unanswered ones. Zero when the test has no points at all.
pub(crate) fn compute_score(points_earned: i64, total_points: i64) -> i32 {
    if total_points <= 0 {
        return 0;
    }
    (points_earned as f64 / total_points as f64 * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;
    use time::{Date, Month, PrimitiveDateTime, Time};

    fn question(
        question_type: QuestionType,
        options: Vec<&str>,
        correct_option: Option<i32>,
        correct_text: Option<&str>,
        points: i32,
    ) -> Question {
        let date = Date::from_calendar_date(2025, Month::May, 1).unwrap();
        let ts = PrimitiveDateTime::new(date, Time::from_hms(12, 0, 0).unwrap());
        Question {
            id: "q-1".to_string(),
            test_id: "t-1".to_string(),
            order_index: 1,
            question_type,
            prompt: "prompt".to_string(),
            options: Json(options.into_iter().map(str::to_string).collect()),
            correct_option,
            correct_text: correct_text.map(str::to_string),
            points,
            solution: None,
            created_at: ts,
        }
    }

    #[test]
    fn multiple_choice_grades_by_index() {
        let q = question(QuestionType::MultipleChoice, vec!["a", "b", "c"], Some(1), None, 5);
        let graded = grade_answer(&q, Some(1), None).unwrap();
        assert!(graded.is_correct);
        assert_eq!(graded.points_earned, 5);

        let graded = grade_answer(&q, Some(2), None).unwrap();
        assert!(!graded.is_correct);
        assert_eq!(graded.points_earned, 0);
    }

    #[test]
    fn multiple_choice_rejects_out_of_range_index() {
        let q = question(QuestionType::MultipleChoice, vec!["a", "b"], Some(0), None, 1);
        assert!(grade_answer(&q, Some(2), None).is_err());
        assert!(grade_answer(&q, Some(-1), None).is_err());
        assert!(grade_answer(&q, None, None).is_err());
    }

    #[test]
    fn true_false_accepts_only_zero_and_one() {
        let q = question(QuestionType::TrueFalse, vec!["True", "False"], Some(0), None, 2);
        assert!(grade_answer(&q, Some(0), None).unwrap().is_correct);
        assert!(!grade_answer(&q, Some(1), None).unwrap().is_correct);
        assert!(grade_answer(&q, Some(2), None).is_err());
    }

    #[test]
    fn short_answer_ignores_case_and_whitespace() {
        let q = question(QuestionType::ShortAnswer, vec![], None, Some("Paris"), 3);
        assert!(grade_answer(&q, None, Some("  paris ")).unwrap().is_correct);
        assert!(!grade_answer(&q, None, Some("London")).unwrap().is_correct);
    }

    #[test]
    fn short_answer_requires_text() {
        let q = question(QuestionType::ShortAnswer, vec![], None, Some("Paris"), 3);
        assert!(grade_answer(&q, None, Some("   ")).is_err());
        assert!(grade_answer(&q, None, None).is_err());
    }

    #[test]
    fn score_is_percentage_of_total_points() {
        assert_eq!(compute_score(0, 10), 0);
        assert_eq!(compute_score(5, 10), 50);
        assert_eq!(compute_score(10, 10), 100);
        // 2/3 -> 66.66 -> 67.
        assert_eq!(compute_score(2, 3), 67);
    }

    #[test]
    fn score_on_zero_total_is_zero() {
        assert_eq!(compute_score(0, 0), 0);
    }
}
