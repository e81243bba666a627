use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Class;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) certification: Option<String>,
    // 0 means unlimited seats.
    #[serde(default)]
    #[serde(alias = "maxStudents")]
    #[validate(range(min = 0, message = "max_students must be non-negative"))]
    pub(crate) max_students: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) certification: Option<String>,
    pub(crate) max_students: i32,
    pub(crate) student_count: i32,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ClassResponse {
    pub(crate) fn from_db(class: Class) -> Self {
        Self {
            id: class.id,
            title: class.title,
            description: class.description,
            certification: class.certification,
            max_students: class.max_students,
            student_count: class.student_count,
            created_by: class.created_by,
            created_at: format_primitive(class.created_at),
            updated_at: format_primitive(class.updated_at),
        }
    }
}
