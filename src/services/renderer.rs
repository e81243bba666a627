use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::core::config::Settings;
use crate::db::models::Certification;

/// Client for the external certificate rendering service. Disabled when no
/// renderer URL is configured.
#[derive(Debug, Clone)]
pub(crate) struct CertificateRenderer {
    client: reqwest::Client,
    base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    artifact_url: String,
}

impl CertificateRenderer {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let certificates = settings.certificates();
        let base_url = if certificates.renderer_url.is_empty() {
            None
        } else {
            Some(certificates.renderer_url.trim_end_matches('/').to_string())
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(certificates.renderer_timeout_seconds))
            .build()
            .context("failed to build certificate renderer client")?;
        Ok(Self { client, base_url })
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    /// Requests a rendered artifact for the certificate. Returns None when
    /// rendering is disabled.
    pub(crate) async fn render(&self, certification: &Certification) -> Result<Option<String>> {
        let Some(base_url) = &self.base_url else {
            return Ok(None);
        };

        let response = self
            .client
            .post(format!("{base_url}/render"))
            .json(&serde_json::json!({
                "certificate_id": certification.id,
                "title": certification.title,
                "verification_code": certification.verification_code,
            }))
            .send()
            .await
            .context("certificate renderer request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("certificate renderer returned {}", response.status()));
        }

        let body: RenderResponse =
            response.json().await.context("invalid certificate renderer response")?;
        Ok(Some(body.artifact_url))
    }
}
