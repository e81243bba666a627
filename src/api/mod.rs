pub(crate) mod attempts;
pub(crate) mod auth;
pub(crate) mod certificates;
pub(crate) mod classes;
pub(crate) mod courses;
pub(crate) mod enrollments;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod lessons;
pub(crate) mod notifications;
pub(crate) mod router;
pub(crate) mod tests;
pub(crate) mod validation;
