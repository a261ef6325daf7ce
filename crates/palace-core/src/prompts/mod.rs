//! Prompt templates for study-plan generation.

pub mod study_plan;

pub use study_plan::{study_plan_user_prompt, STUDY_PLAN_SYSTEM, STUDY_PLAN_USER_TEMPLATE};
