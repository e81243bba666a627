use std::time::Duration;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Certification;
use crate::repositories;

pub(crate) const KIND_CERTIFICATE_ISSUED: &str = "certificate_issued";

/// Records an in-app notification and forwards it to the email webhook when
/// one is configured. Idempotent per certificate: the award path and the
/// artifact repair sweep can both call this without producing duplicates.
/// Failures are reported to the caller, which logs and moves on.
pub(crate) async fn notify_certificate_issued(
    state: &AppState,
    certification: &Certification,
) -> Result<()> {
    let already_notified = repositories::notifications::exists_for_certificate(
        state.db(),
        &certification.user_id,
        KIND_CERTIFICATE_ISSUED,
        &certification.id,
    )
    .await
    .context("failed to check for an existing notification")?;
    if already_notified {
        return Ok(());
    }

    let payload = serde_json::json!({
        "certificate_id": certification.id,
        "title": certification.title,
        "verification_code": certification.verification_code,
    });

    repositories::notifications::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        &certification.user_id,
        KIND_CERTIFICATE_ISSUED,
        payload.clone(),
        primitive_now_utc(),
    )
    .await
    .context("failed to store notification")?;

    send_email_webhook(state, &certification.user_id, payload).await
}

async fn send_email_webhook(
    state: &AppState,
    user_id: &str,
    payload: serde_json::Value,
) -> Result<()> {
    let notifications = state.settings().notifications();
    if notifications.email_webhook_url.is_empty() {
        return Ok(());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(notifications.webhook_timeout_seconds))
        .build()
        .context("failed to build webhook client")?;

    let response = client
        .post(&notifications.email_webhook_url)
        .json(&serde_json::json!({
            "user_id": user_id,
            "kind": KIND_CERTIFICATE_ISSUED,
            "payload": payload,
        }))
        .send()
        .await
        .context("email webhook request failed")?;

    if !response.status().is_success() {
        anyhow::bail!("email webhook returned {}", response.status());
    }
    Ok(())
}
