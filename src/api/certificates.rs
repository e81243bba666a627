use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::certificate::{CertificateResponse, CertificateVerifyResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_certificates))
        .route("/verify/:code", get(verify))
}

async fn list_my_certificates(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CertificateResponse>>, ApiError> {
    let rows = repositories::certifications::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list certificates"))?;
    Ok(Json(rows.into_iter().map(CertificateResponse::from_db).collect()))
}

/// Public endpoint: no authentication, used by third parties to check a
/// certificate code.
async fn verify(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<CertificateVerifyResponse>, ApiError> {
    let certification = repositories::certifications::find_by_verification_code(state.db(), &code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to verify certificate"))?
        .ok_or_else(|| ApiError::NotFound("Certificate not found".to_string()))?;

    Ok(Json(CertificateVerifyResponse::from_db(certification)))
}
