//! HTTP handlers, grouped by area.

pub mod courses;
pub mod palace;
pub mod study_plan;
pub mod vark;
