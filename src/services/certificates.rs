use anyhow::{anyhow, Result};
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Certification;
use crate::db::types::EnrollmentStatus;
use crate::repositories;
use crate::repositories::certifications::CreateCertification;
use crate::services::{notifications, renderer::CertificateRenderer, verification};

/// Awards a course certificate when every precondition holds, in order:
/// active enrollment, course offers a certificate, none awarded yet,
/// enrollment completed at 100%. Any failed precondition returns None.
pub(crate) async fn check_and_award_for_course(
    state: &AppState,
    user_id: &str,
    course_id: &str,
) -> Result<Option<Certification>> {
    let Some(enrollment) =
        repositories::enrollments::find_for_user_course(state.db(), user_id, course_id).await?
    else {
        return Ok(None);
    };
    if enrollment.status == EnrollmentStatus::Dropped {
        return Ok(None);
    }
    let Some(course) = repositories::courses::find_by_id(state.db(), course_id).await? else {
        return Ok(None);
    };
    let Some(title) = course.certification.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if repositories::certifications::find_for_user_course(state.db(), user_id, course_id)
        .await?
        .is_some()
    {
        return Ok(None);
    }
    if enrollment.progress < 100 || enrollment.status != EnrollmentStatus::Completed {
        return Ok(None);
    }

    award(state, user_id, Some(course_id), None, &title).await
}

/// Class variant: the class carries its own certificate title and scope.
pub(crate) async fn check_and_award_for_class(
    state: &AppState,
    user_id: &str,
    class_id: &str,
) -> Result<Option<Certification>> {
    let Some(enrollment) =
        repositories::enrollments::find_for_user_class(state.db(), user_id, class_id).await?
    else {
        return Ok(None);
    };
    if enrollment.status == EnrollmentStatus::Dropped {
        return Ok(None);
    }
    let Some(class) = repositories::classes::find_by_id(state.db(), class_id).await? else {
        return Ok(None);
    };
    let Some(title) = class.certification.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if repositories::certifications::find_for_user_class(state.db(), user_id, class_id)
        .await?
        .is_some()
    {
        return Ok(None);
    }
    if enrollment.progress < 100 || enrollment.status != EnrollmentStatus::Completed {
        return Ok(None);
    }

    award(state, user_id, None, Some(class_id), &title).await
}

async fn award(
    state: &AppState,
    user_id: &str,
    course_id: Option<&str>,
    class_id: Option<&str>,
    title: &str,
) -> Result<Option<Certification>> {
    let code = generate_unique_code(state).await?;
    let id = Uuid::new_v4().to_string();
    let issued_at = primitive_now_utc();

    let inserted = repositories::certifications::create(
        state.db(),
        CreateCertification {
            id: &id,
            user_id,
            course_id,
            class_id,
            title,
            verification_code: &code,
            issued_at,
        },
    )
    .await?;

    // A concurrent award won the race; its row stands.
    if !inserted {
        return Ok(None);
    }

    let certification = repositories::certifications::find_by_id(state.db(), &id)
        .await?
        .ok_or_else(|| anyhow!("certificate {id} vanished after insert"))?;

    dispatch_side_effects(state.clone(), certification.clone());

    Ok(Some(certification))
}

async fn generate_unique_code(state: &AppState) -> Result<String> {
    let max_retries = state.settings().certificates().code_max_retries;
    for _ in 0..max_retries {
        let code = verification::generate_verification_code();
        if !repositories::certifications::code_exists(state.db(), &code).await? {
            return Ok(code);
        }
    }
    Err(anyhow!("could not generate a unique verification code after {max_retries} attempts"))
}

/// Artifact rendering and notification run detached; the awarded row is
/// already committed and is never rolled back by a side-effect failure.
fn dispatch_side_effects(state: AppState, certification: Certification) {
    tokio::spawn(async move {
        match CertificateRenderer::from_settings(state.settings()) {
            Ok(renderer) => match renderer.render(&certification).await {
                Ok(Some(artifact_url)) => {
                    if let Err(err) = repositories::certifications::set_artifact_url(
                        state.db(),
                        &certification.id,
                        &artifact_url,
                    )
                    .await
                    {
                        tracing::error!(
                            certificate_id = %certification.id,
                            error = %err,
                            "failed to store certificate artifact url"
                        );
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        certificate_id = %certification.id,
                        error = %format!("{err:#}"),
                        "certificate rendering failed, repair sweep will retry"
                    );
                }
            },
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "certificate renderer unavailable");
            }
        }

        if let Err(err) = notifications::notify_certificate_issued(&state, &certification).await {
            tracing::warn!(
                certificate_id = %certification.id,
                error = %format!("{err:#}"),
                "certificate notification failed"
            );
        }
    });
}
