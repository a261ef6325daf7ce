//! Records exchanged with the relational store: courses, modules, enrollments,
//! profiles, palaces and study plans.

use crate::error::PalaceError;
use crate::palace_store::FurnitureType;
use crate::vark::{ScoreTally, VarkCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    #[default]
    Student,
    Professor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    #[default]
    Bedroom,
    Study,
    Library,
    Lab,
}

impl RoomType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Bedroom => "Dormitorio",
            Self::Study => "Estudio",
            Self::Library => "Biblioteca",
            Self::Lab => "Laboratorio",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: AppRole,
    #[serde(default)]
    pub vark_visual: Option<u32>,
    #[serde(default)]
    pub vark_auditory: Option<u32>,
    #[serde(default)]
    pub vark_reading: Option<u32>,
    #[serde(default)]
    pub vark_kinesthetic: Option<u32>,
    #[serde(default)]
    pub learning_style: Option<VarkCategory>,
    #[serde(default)]
    pub test_completed: Option<bool>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            full_name: None,
            role: AppRole::Student,
            vark_visual: None,
            vark_auditory: None,
            vark_reading: None,
            vark_kinesthetic: None,
            learning_style: None,
            test_completed: None,
            updated_at: None,
        }
    }

    /// Users who have not finished the questionnaire are routed to it.
    pub fn needs_questionnaire(&self) -> bool {
        !self.test_completed.unwrap_or(false)
    }

    /// Stored VARK counters, if the questionnaire was completed.
    pub fn scores(&self) -> Option<ScoreTally> {
        Some(ScoreTally {
            visual: self.vark_visual?,
            auditory: self.vark_auditory?,
            reading: self.vark_reading?,
            kinesthetic: self.vark_kinesthetic?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub professor_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub room_type: RoomType,
    #[serde(default)]
    pub syllabus_url: Option<String>,
    #[serde(default)]
    pub content_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: String,
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    pub order_index: u32,
}

impl CourseModule {
    /// Text handed to the study-plan generator: content, else description, else title.
    pub fn plan_source_text(&self) -> &str {
        [self.content.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(self.title.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: String,
    pub course_id: String,
    pub student_id: String,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentalPalace {
    pub id: String,
    pub course_id: String,
    pub student_id: String,
    #[serde(default)]
    pub palace_config: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl FromStr for TaskPriority {
    type Err = PalaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(PalaceError::InvalidCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Practice,
    Review,
    Create,
    Memorize,
}

impl FromStr for TaskType {
    type Err = PalaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "practice" => Ok(Self::Practice),
            "review" => Ok(Self::Review),
            "create" => Ok(Self::Create),
            "memorize" => Ok(Self::Memorize),
            _ => Err(PalaceError::InvalidCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technique {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub estimated_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_tag")]
    pub priority: TaskPriority,
    #[serde(default, rename = "type", deserialize_with = "lenient_tag")]
    pub task_type: TaskType,
}

/// Model output is loose: an unknown tag falls back to the default instead of
/// rejecting the whole plan.
fn lenient_tag<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: FromStr + Default,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()).unwrap_or_default())
}

/// Generated plan content for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlanContent {
    #[serde(default)]
    pub techniques: Vec<Technique>,
    #[serde(default)]
    pub tasks: Vec<StudyTask>,
    #[serde(default)]
    pub mnemonic_tips: Vec<String>,
}

impl StudyPlanContent {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.techniques.is_empty() && self.tasks.is_empty() && self.mnemonic_tips.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlanRecord {
    pub id: String,
    pub palace_id: String,
    pub module_id: String,
    #[serde(default)]
    pub learning_style: Option<VarkCategory>,
    #[serde(default)]
    pub techniques: Vec<Technique>,
    #[serde(default)]
    pub tasks: Vec<StudyTask>,
    pub generated_at: DateTime<Utc>,
}

/// A module placed on a piece of furniture in the palace room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FurniturePlacement {
    pub furniture: FurnitureType,
    pub module: CourseModule,
    pub has_plan: bool,
}

/// Placement order of modules in the room.
pub const PLACEMENT_ORDER: [FurnitureType; 6] = [
    FurnitureType::Bed,
    FurnitureType::Desk,
    FurnitureType::Wardrobe,
    FurnitureType::Shelf,
    FurnitureType::Nightstand,
    FurnitureType::Chair,
];

/// Place the first six modules (by `order_index`) on the room furniture.
pub fn place_modules(modules: &[CourseModule], plans: &[StudyPlanRecord]) -> Vec<FurniturePlacement> {
    let mut ordered: Vec<&CourseModule> = modules.iter().collect();
    ordered.sort_by_key(|m| m.order_index);
    ordered
        .into_iter()
        .zip(PLACEMENT_ORDER)
        .map(|(module, furniture)| FurniturePlacement {
            furniture,
            has_plan: plans.iter().any(|p| p.module_id == module.id),
            module: module.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str, order_index: u32) -> CourseModule {
        CourseModule {
            id: id.to_string(),
            course_id: "c1".to_string(),
            title: format!("Módulo {}", id),
            description: None,
            content: None,
            order_index,
        }
    }

    #[test]
    fn plan_source_text_falls_back() {
        let mut m = module("m1", 0);
        assert_eq!(m.plan_source_text(), "Módulo m1");
        m.description = Some("desc".into());
        assert_eq!(m.plan_source_text(), "desc");
        m.content = Some("contenido".into());
        assert_eq!(m.plan_source_text(), "contenido");
        m.content = Some("   ".into());
        assert_eq!(m.plan_source_text(), "desc");
    }

    #[test]
    fn only_six_modules_are_placed_in_order() {
        let modules: Vec<CourseModule> = (0..8).rev().map(|i| module(&format!("m{}", i), i)).collect();
        let plans = vec![StudyPlanRecord {
            id: "p".into(),
            palace_id: "pal".into(),
            module_id: "m1".into(),
            learning_style: None,
            techniques: vec![],
            tasks: vec![],
            generated_at: Utc::now(),
        }];
        let placed = place_modules(&modules, &plans);
        assert_eq!(placed.len(), 6);
        assert_eq!(placed[0].module.id, "m0");
        assert_eq!(placed[0].furniture, FurnitureType::Bed);
        assert_eq!(placed[3].furniture, FurnitureType::Shelf);
        assert!(placed[1].has_plan);
        assert!(!placed[0].has_plan);
    }

    #[test]
    fn profile_without_test_needs_questionnaire() {
        let mut p = Profile::new("u1");
        assert!(p.needs_questionnaire());
        assert!(p.scores().is_none());
        p.test_completed = Some(true);
        assert!(!p.needs_questionnaire());
    }

    #[test]
    fn study_plan_content_uses_camel_case_keys() {
        let json = r#"{"techniques":[{"name":"Mapa mental","description":"d","steps":["a"],"estimatedTime":"30 minutos"}],
            "tasks":[{"title":"t","description":"d","priority":"high","type":"memorize"}],
            "mnemonicTips":["tip"]}"#;
        let plan: StudyPlanContent = serde_json::from_str(json).unwrap();
        assert_eq!(plan.techniques[0].estimated_time.as_deref(), Some("30 minutos"));
        assert_eq!(plan.tasks[0].priority, TaskPriority::High);
        assert_eq!(plan.tasks[0].task_type, TaskType::Memorize);
        assert_eq!(plan.mnemonic_tips, vec!["tip".to_string()]);
    }

    #[test]
    fn unknown_task_tags_fall_back_to_defaults() {
        let task: StudyTask =
            serde_json::from_str(r#"{"title":"t","priority":"urgent","type":null}"#).unwrap();
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.task_type, TaskType::Practice);
    }
}
