//! palace-core: Mental Palace core library.
//!
//! VARK learning-style classifier and questionnaire, the per-session palace
//! interaction store, course/profile records with a sled-backed local store, and
//! study-plan generation through a remote chat-completions endpoint.

mod assessment;
mod config;
mod error;
mod palace_store;
mod record_store;
mod records;
mod study_plan;
pub mod prompts;
pub mod vark;

pub use assessment::submit_answers;
pub use config::{PalaceConfig, DEFAULT_LLM_API_URL, DEFAULT_LLM_MODEL};
pub use error::{PalaceError, PalaceResult};

// Palace interaction store
pub use palace_store::{
    FurnitureInteraction, FurnitureType, LearningItem, LegendEntry, NewTask, PalaceSnapshot,
    PalaceStore, INITIAL_PROGRESS, MOST_VISITED_SHOWN, PROGRESS_MAX, PROGRESS_STEP, SELECT_PROMPT,
    WELCOME_MESSAGE,
};

// Records + local store
pub use record_store::{MaterialKind, NewCourse, NewModule, RecordStore};
pub use records::{
    place_modules, AppRole, Course, CourseModule, Enrollment, FurniturePlacement, MentalPalace,
    Profile, RoomType, StudyPlanContent, StudyPlanRecord, StudyTask, TaskPriority, TaskType,
    Technique, PLACEMENT_ORDER,
};

// VARK classifier
pub use vark::{
    score, score_complete, total_questions, AnswerSet, Question, QuestionOption, ScoreTally,
    VarkCategory, VarkResult, QUESTIONNAIRE,
};

// Study plans
pub use study_plan::{
    generate_missing_plans, generate_or_empty, parse_plan_reply, EmptyPlanGenerator,
    LlmPlanGenerator, PlanRequest, StudyPlanGenerator,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
