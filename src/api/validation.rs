use validator::Validate;

use crate::api::errors::ApiError;
use crate::db::types::QuestionType;
use crate::schemas::test::QuestionCreate;

/// Runs derive-based validation and flattens the first failure into a 400.
pub(crate) fn validate_payload<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload.validate().map_err(|errors| ApiError::BadRequest(errors.to_string()))
}

/// Structural checks the derive macro cannot express: each question type
/// requires its own answer-key shape.
pub(crate) fn validate_question(question: &QuestionCreate) -> Result<(), ApiError> {
    match question.question_type {
        QuestionType::MultipleChoice => {
            if question.options.len() < 2 {
                return Err(ApiError::BadRequest(
                    "multiple_choice questions need at least two options".to_string(),
                ));
            }
            let correct = question.correct_option.ok_or_else(|| {
                ApiError::BadRequest("multiple_choice questions require correct_option".to_string())
            })?;
            if correct < 0 || correct as usize >= question.options.len() {
                return Err(ApiError::BadRequest(
                    "correct_option is out of range".to_string(),
                ));
            }
        }
        QuestionType::TrueFalse => {
            let correct = question.correct_option.ok_or_else(|| {
                ApiError::BadRequest("true_false questions require correct_option".to_string())
            })?;
            if correct != 0 && correct != 1 {
                return Err(ApiError::BadRequest(
                    "true_false correct_option must be 0 or 1".to_string(),
                ));
            }
        }
        QuestionType::ShortAnswer => {
            let has_text =
                question.correct_text.as_deref().map(|t| !t.trim().is_empty()).unwrap_or(false);
            if !has_text {
                return Err(ApiError::BadRequest(
                    "short_answer questions require correct_text".to_string(),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_question(question_type: QuestionType) -> QuestionCreate {
        QuestionCreate {
            question_type,
            prompt: "prompt".to_string(),
            options: Vec::new(),
            correct_option: None,
            correct_text: None,
            points: 1,
            solution: None,
        }
    }

    #[test]
    fn multiple_choice_requires_options_and_key() {
        let mut q = base_question(QuestionType::MultipleChoice);
        assert!(validate_question(&q).is_err());

        q.options = vec!["a".to_string(), "b".to_string()];
        assert!(validate_question(&q).is_err());

        q.correct_option = Some(1);
        assert!(validate_question(&q).is_ok());

        q.correct_option = Some(2);
        assert!(validate_question(&q).is_err());
    }

    #[test]
    fn true_false_requires_binary_key() {
        let mut q = base_question(QuestionType::TrueFalse);
        assert!(validate_question(&q).is_err());

        q.correct_option = Some(1);
        assert!(validate_question(&q).is_ok());

        q.correct_option = Some(3);
        assert!(validate_question(&q).is_err());
    }

    #[test]
    fn short_answer_requires_correct_text() {
        let mut q = base_question(QuestionType::ShortAnswer);
        assert!(validate_question(&q).is_err());

        q.correct_text = Some("  ".to_string());
        assert!(validate_question(&q).is_err());

        q.correct_text = Some("Paris".to_string());
        assert!(validate_question(&q).is_ok());
    }
}
