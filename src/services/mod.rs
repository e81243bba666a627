pub(crate) mod attempts;
pub(crate) mod certificates;
pub(crate) mod grading;
pub(crate) mod notifications;
pub(crate) mod progress;
pub(crate) mod renderer;
pub(crate) mod verification;
