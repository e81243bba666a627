pub(crate) mod answers;
pub(crate) mod attempts;
pub(crate) mod certifications;
pub(crate) mod classes;
pub(crate) mod courses;
pub(crate) mod enrollments;
pub(crate) mod lesson_progress;
pub(crate) mod lessons;
pub(crate) mod notifications;
pub(crate) mod questions;
pub(crate) mod tests;
pub(crate) mod users;
