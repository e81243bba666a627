use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::Enrollment;
use crate::db::types::EnrollmentStatus;

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: Option<String>,
    pub(crate) class_id: Option<String>,
    pub(crate) status: EnrollmentStatus,
    pub(crate) progress: i32,
    pub(crate) enrolled_at: String,
    pub(crate) completed_at: Option<String>,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            user_id: enrollment.user_id,
            course_id: enrollment.course_id,
            class_id: enrollment.class_id,
            status: enrollment.status,
            progress: enrollment.progress,
            enrolled_at: format_primitive(enrollment.enrolled_at),
            completed_at: enrollment.completed_at.map(format_primitive),
        }
    }
}
