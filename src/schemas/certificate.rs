use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::Certification;
use crate::db::types::CertificationStatus;

#[derive(Debug, Serialize)]
pub(crate) struct CertificateResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: Option<String>,
    pub(crate) class_id: Option<String>,
    pub(crate) title: String,
    pub(crate) verification_code: String,
    pub(crate) status: CertificationStatus,
    pub(crate) artifact_url: Option<String>,
    pub(crate) issued_at: String,
}

impl CertificateResponse {
    pub(crate) fn from_db(certification: Certification) -> Self {
        Self {
            id: certification.id,
            user_id: certification.user_id,
            course_id: certification.course_id,
            class_id: certification.class_id,
            title: certification.title,
            verification_code: certification.verification_code,
            status: certification.status,
            artifact_url: certification.artifact_url,
            issued_at: format_primitive(certification.issued_at),
        }
    }
}

/// Public verification view. No user identifier beyond the certificate title.
#[derive(Debug, Serialize)]
pub(crate) struct CertificateVerifyResponse {
    pub(crate) verification_code: String,
    pub(crate) title: String,
    pub(crate) status: CertificationStatus,
    pub(crate) issued_at: String,
    pub(crate) valid: bool,
}

impl CertificateVerifyResponse {
    pub(crate) fn from_db(certification: Certification) -> Self {
        let valid = certification.status == CertificationStatus::Issued;
        Self {
            verification_code: certification.verification_code,
            title: certification.title,
            status: certification.status,
            issued_at: format_primitive(certification.issued_at),
            valid,
        }
    }
}
