use anyhow::{Context, Result};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::services::renderer::CertificateRenderer;

const ARTIFACT_REPAIR_BATCH: i64 = 50;

/// Marks in-progress attempts abandoned once they have been idle longer than
/// the test duration plus the configured grace period.
pub(crate) async fn abandon_stale_attempts(state: &AppState) -> Result<()> {
    let grace_minutes = state.settings().testing().abandon_grace_minutes as i64;
    let abandoned =
        repositories::attempts::abandon_stale(state.db(), grace_minutes, primitive_now_utc())
            .await
            .context("Failed to abandon stale attempts")?;

    if abandoned > 0 {
        tracing::info!(abandoned, "Abandoned stale test attempts");
        metrics::counter!("test_attempts_abandoned_total").increment(abandoned);
    }

    Ok(())
}

/// Re-renders artifacts for issued certificates whose fire-and-forget render
/// failed at award time.
pub(crate) async fn repair_missing_artifacts(state: &AppState) -> Result<()> {
    let renderer = CertificateRenderer::from_settings(state.settings())
        .context("Failed to build certificate renderer")?;
    if !renderer.is_enabled() {
        return Ok(());
    }

    let pending =
        repositories::certifications::list_missing_artifacts(state.db(), ARTIFACT_REPAIR_BATCH)
            .await
            .context("Failed to list certificates missing artifacts")?;

    let mut repaired = 0u64;
    for certification in pending {
        match renderer.render(&certification).await {
            Ok(Some(artifact_url)) => {
                repositories::certifications::set_artifact_url(
                    state.db(),
                    &certification.id,
                    &artifact_url,
                )
                .await
                .context("Failed to store repaired artifact url")?;
                repaired += 1;
            }
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(
                    certificate_id = %certification.id,
                    error = %format!("{err:#}"),
                    "Certificate artifact repair failed"
                );
            }
        }
    }

    if repaired > 0 {
        tracing::info!(repaired, "Repaired certificate artifacts");
        metrics::counter!("certificate_artifacts_repaired_total").increment(repaired);
    }

    Ok(())
}
