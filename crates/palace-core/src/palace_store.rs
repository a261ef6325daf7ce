//! Palace interaction store: session-local UI focus, assistant panel, progress,
//! learning items and per-furniture visit counters.
//!
//! One instance per browser session; callers own it and mutate it synchronously in
//! the order user events arrive. The gateway keeps one per session id.

use crate::error::PalaceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const INITIAL_PROGRESS: u8 = 25;
pub const PROGRESS_STEP: u8 = 15;
pub const PROGRESS_MAX: u8 = 100;

pub const WELCOME_MESSAGE: &str = "¡Bienvenido a tu Palacio Mental! 🏰 Explora cada mueble para descubrir diferentes áreas de aprendizaje. Haz clic en cualquier objeto para comenzar.";
pub const SELECT_PROMPT: &str = "Selecciona un mueble para explorar su contenido de aprendizaje.";

/// Furniture categories of the palace room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FurnitureType {
    Bed,
    Desk,
    Wardrobe,
    Nightstand,
    Shelf,
    Chair,
}

impl FurnitureType {
    pub const ALL: [FurnitureType; 6] = [
        FurnitureType::Bed,
        FurnitureType::Desk,
        FurnitureType::Wardrobe,
        FurnitureType::Nightstand,
        FurnitureType::Shelf,
        FurnitureType::Chair,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bed => "bed",
            Self::Desk => "desk",
            Self::Wardrobe => "wardrobe",
            Self::Nightstand => "nightstand",
            Self::Shelf => "shelf",
            Self::Chair => "chair",
        }
    }

    /// Assistant message shown when this furniture is selected.
    pub fn assistant_message(self) -> &'static str {
        match self {
            Self::Bed => "🛏️ Estás en la Cama - el lugar de los conceptos fundacionales. Aquí reposas mientras absorbes los fundamentos de tu aprendizaje. Relájate y deja que la información fluya.",
            Self::Desk => "📚 Bienvenido al Escritorio - tu espacio de conocimiento aplicado. Aquí encontrarás tareas, ejercicios prácticos y casos reales para poner en práctica lo aprendido.",
            Self::Wardrobe => "🧍‍♂️ El Armario guarda tus listas clasificadas. Abre las puertas para explorar procesos paso a paso, módulos de aprendizaje y carpetas de memoria organizadas.",
            Self::Nightstand => "🌜 La Mesa de Noche contiene lo urgente. Aquí encontrarás tus tareas pendientes, notas rápidas y recordatorios importantes que requieren tu atención.",
            Self::Shelf => "🔖 La Estantería es tu biblioteca de logros. Cada libro representa un módulo dominado, conocimiento consolidado que ya forma parte de ti.",
            Self::Chair => "🪑 La Silla del Escritorio activa tu autoevaluación. Siéntate para reflexionar, responder quiz rápidos y medir tu comprensión.",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Bed => "🛏️",
            Self::Desk => "📚",
            Self::Wardrobe => "🧍",
            Self::Nightstand => "🌜",
            Self::Shelf => "🔖",
            Self::Chair => "🪑",
        }
    }

    /// Legend label (learning area).
    pub fn area_label(self) -> &'static str {
        match self {
            Self::Bed => "Fundamentos",
            Self::Desk => "Práctica",
            Self::Wardrobe => "Módulos",
            Self::Nightstand => "Pendientes",
            Self::Shelf => "Logros",
            Self::Chair => "Evaluación",
        }
    }

    /// Furniture name, as shown in the progress sidebar.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bed => "Cama",
            Self::Desk => "Escritorio",
            Self::Wardrobe => "Armario",
            Self::Nightstand => "Mesa de noche",
            Self::Shelf => "Estantería",
            Self::Chair => "Silla",
        }
    }
}

impl fmt::Display for FurnitureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FurnitureType {
    type Err = PalaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bed" => Ok(Self::Bed),
            "desk" => Ok(Self::Desk),
            "wardrobe" => Ok(Self::Wardrobe),
            "nightstand" => Ok(Self::Nightstand),
            "shelf" => Ok(Self::Shelf),
            "chair" => Ok(Self::Chair),
            _ => Err(PalaceError::InvalidCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub category: Option<FurnitureType>,
}

impl LearningItem {
    fn seed(id: &str, title: &str, description: &str, category: FurnitureType) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            completed: false,
            category: Some(category),
        }
    }
}

/// Input of [`PalaceStore::add_pending_task`]: an item without id or completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<FurnitureType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FurnitureInteraction {
    pub furniture: FurnitureType,
    pub interactions: u32,
    pub last_visited: Option<DateTime<Utc>>,
}

/// Entries shown in the "most visited areas" sidebar.
pub const MOST_VISITED_SHOWN: usize = 3;

/// One row of the room legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub furniture: FurnitureType,
    pub icon: &'static str,
    pub name: &'static str,
    pub area_label: &'static str,
}

impl FurnitureType {
    pub fn legend_entry(self) -> LegendEntry {
        LegendEntry {
            furniture: self,
            icon: self.icon(),
            name: self.name(),
            area_label: self.area_label(),
        }
    }
}

/// Serializable view of the whole store.
#[derive(Debug, Clone, Serialize)]
pub struct PalaceSnapshot {
    pub selected_furniture: Option<FurnitureType>,
    pub assistant_open: bool,
    pub assistant_message: String,
    pub progress: u8,
    pub learning_items: Vec<LearningItem>,
    pub pending_tasks: Vec<LearningItem>,
    pub completed_items: Vec<LearningItem>,
    pub furniture_stats: BTreeMap<FurnitureType, FurnitureInteraction>,
    pub most_visited: Vec<FurnitureInteraction>,
    pub legend: Vec<LegendEntry>,
}

#[derive(Debug, Clone)]
pub struct PalaceStore {
    selected: Option<FurnitureType>,
    assistant_open: bool,
    assistant_message: String,
    progress: u8,
    learning_items: Vec<LearningItem>,
    pending_tasks: Vec<LearningItem>,
    completed_items: Vec<LearningItem>,
    stats: BTreeMap<FurnitureType, FurnitureInteraction>,
}

impl Default for PalaceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PalaceStore {
    /// Fresh store with the seed learning items and pending tasks.
    pub fn new() -> Self {
        let learning_items = vec![
            LearningItem::seed("1", "Filosofía del curso", "Comprende los principios fundamentales", FurnitureType::Bed),
            LearningItem::seed("2", "Conceptos clave iniciales", "Domina las bases teóricas", FurnitureType::Bed),
            LearningItem::seed("3", "Proceso de onboarding", "Fases del programa de integración", FurnitureType::Wardrobe),
            LearningItem::seed("4", "Ejercicio práctico 1", "Aplica los conceptos aprendidos", FurnitureType::Desk),
            LearningItem::seed("5", "Quiz de comprensión", "Evalúa tu progreso", FurnitureType::Chair),
        ];
        let pending_tasks = vec![
            LearningItem::seed("p1", "Revisar fundamentos", "Pendiente para hoy", FurnitureType::Nightstand),
            LearningItem::seed("p2", "Completar módulo 2", "Fecha límite: mañana", FurnitureType::Nightstand),
        ];
        Self::with_items(learning_items, pending_tasks)
    }

    /// Store seeded with caller-provided items (e.g. derived from fetched modules).
    pub fn with_items(learning_items: Vec<LearningItem>, pending_tasks: Vec<LearningItem>) -> Self {
        let stats = FurnitureType::ALL
            .iter()
            .map(|f| {
                (
                    *f,
                    FurnitureInteraction {
                        furniture: *f,
                        interactions: 0,
                        last_visited: None,
                    },
                )
            })
            .collect();
        Self {
            selected: None,
            assistant_open: true,
            assistant_message: WELCOME_MESSAGE.to_string(),
            progress: INITIAL_PROGRESS,
            learning_items,
            pending_tasks,
            completed_items: Vec::new(),
            stats,
        }
    }

    pub fn selected(&self) -> Option<FurnitureType> {
        self.selected
    }

    pub fn assistant_open(&self) -> bool {
        self.assistant_open
    }

    pub fn assistant_message(&self) -> &str {
        &self.assistant_message
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn learning_items(&self) -> &[LearningItem] {
        &self.learning_items
    }

    pub fn pending_tasks(&self) -> &[LearningItem] {
        &self.pending_tasks
    }

    pub fn completed_items(&self) -> &[LearningItem] {
        &self.completed_items
    }

    pub fn stats(&self, furniture: FurnitureType) -> FurnitureInteraction {
        // Every furniture type is seeded in `with_items`.
        self.stats.get(&furniture).copied().unwrap_or(FurnitureInteraction {
            furniture,
            interactions: 0,
            last_visited: None,
        })
    }

    /// Select a furniture (or clear the selection) and update the assistant message.
    /// A non-empty selection also counts as a visit.
    pub fn select_furniture(&mut self, furniture: Option<FurnitureType>) {
        self.selected = furniture;
        self.assistant_message = match furniture {
            Some(f) => f.assistant_message().to_string(),
            None => SELECT_PROMPT.to_string(),
        };
        if let Some(f) = furniture {
            self.record_visit(f, Utc::now());
        }
    }

    /// Raw-tag variant of [`select_furniture`](Self::select_furniture). An empty tag
    /// clears the selection; an unknown tag is rejected before any state changes.
    pub fn select_tag(&mut self, tag: Option<&str>) -> Result<(), PalaceError> {
        let furniture = match tag.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => Some(t.parse::<FurnitureType>()?),
            None => None,
        };
        self.select_furniture(furniture);
        Ok(())
    }

    fn record_visit(&mut self, furniture: FurnitureType, at: DateTime<Utc>) {
        let entry = self.stats.entry(furniture).or_insert(FurnitureInteraction {
            furniture,
            interactions: 0,
            last_visited: None,
        });
        entry.interactions += 1;
        // Clock steps backwards never move last_visited back.
        entry.last_visited = Some(entry.last_visited.map_or(at, |prev| prev.max(at)));
        tracing::debug!(
            target: "palace::store",
            furniture = %furniture,
            interactions = entry.interactions,
            "Furniture visited"
        );
    }

    pub fn toggle_assistant(&mut self) {
        self.assistant_open = !self.assistant_open;
    }

    pub fn set_assistant_message(&mut self, message: impl Into<String>) {
        self.assistant_message = message.into();
    }

    /// Complete an item by id. Looks in the learning items first, then the pending tasks.
    /// Returns false (and changes nothing) when the id is unknown or already completed.
    pub fn complete_item(&mut self, id: &str) -> bool {
        let item = if let Some(pos) = self.learning_items.iter().position(|i| i.id == id) {
            self.learning_items.remove(pos)
        } else if let Some(pos) = self.pending_tasks.iter().position(|i| i.id == id) {
            self.pending_tasks.remove(pos)
        } else {
            return false;
        };

        self.completed_items.push(LearningItem {
            completed: true,
            ..item
        });
        self.progress = self.progress.saturating_add(PROGRESS_STEP).min(PROGRESS_MAX);
        tracing::info!(target: "palace::store", id, progress = self.progress, "Item completed");
        true
    }

    /// Append a pending task with a fresh unique id. Returns the new id.
    pub fn add_pending_task(&mut self, task: NewTask) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.pending_tasks.push(LearningItem {
            id: id.clone(),
            title: task.title,
            description: task.description,
            completed: false,
            category: task.category,
        });
        id
    }

    /// Top `n` furniture by interaction count; ties keep declaration order.
    pub fn most_visited(&self, n: usize) -> Vec<FurnitureInteraction> {
        let mut all: Vec<FurnitureInteraction> = FurnitureType::ALL.iter().map(|f| self.stats(*f)).collect();
        // Stable sort keeps declaration order among equal counts.
        all.sort_by(|a, b| b.interactions.cmp(&a.interactions));
        all.truncate(n);
        all
    }

    pub fn snapshot(&self) -> PalaceSnapshot {
        PalaceSnapshot {
            selected_furniture: self.selected,
            assistant_open: self.assistant_open,
            assistant_message: self.assistant_message.clone(),
            progress: self.progress,
            learning_items: self.learning_items.clone(),
            pending_tasks: self.pending_tasks.clone(),
            completed_items: self.completed_items.clone(),
            furniture_stats: self.stats.clone(),
            most_visited: self.most_visited(MOST_VISITED_SHOWN),
            legend: FurnitureType::ALL.iter().map(|f| f.legend_entry()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let store = PalaceStore::new();
        assert_eq!(store.selected(), None);
        assert!(store.assistant_open());
        assert_eq!(store.assistant_message(), WELCOME_MESSAGE);
        assert_eq!(store.progress(), 25);
        assert_eq!(store.learning_items().len(), 5);
        assert_eq!(store.pending_tasks().len(), 2);
        assert!(store.completed_items().is_empty());
        for f in FurnitureType::ALL {
            assert_eq!(store.stats(f).interactions, 0);
            assert!(store.stats(f).last_visited.is_none());
        }
    }

    #[test]
    fn clearing_selection_shows_prompt_without_counting_a_visit() {
        let mut store = PalaceStore::new();
        store.select_furniture(Some(FurnitureType::Shelf));
        store.select_furniture(None);
        assert_eq!(store.selected(), None);
        assert_eq!(store.assistant_message(), SELECT_PROMPT);
        let total: u32 = FurnitureType::ALL.iter().map(|f| store.stats(*f).interactions).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn unknown_tag_leaves_state_untouched() {
        let mut store = PalaceStore::new();
        let err = store.select_tag(Some("sofa")).unwrap_err();
        assert!(matches!(err, PalaceError::InvalidCategory(_)));
        assert_eq!(store.assistant_message(), WELCOME_MESSAGE);

        store.select_tag(Some("Desk")).unwrap();
        assert_eq!(store.selected(), Some(FurnitureType::Desk));
        store.select_tag(Some("  ")).unwrap();
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn toggle_assistant_flips() {
        let mut store = PalaceStore::new();
        store.toggle_assistant();
        assert!(!store.assistant_open());
        store.toggle_assistant();
        assert!(store.assistant_open());
    }

    #[test]
    fn complete_pending_task_and_added_task() {
        let mut store = PalaceStore::new();
        assert!(store.complete_item("p1"));
        let id = store.add_pending_task(NewTask {
            title: "Leer capítulo 3".into(),
            description: String::new(),
            category: Some(FurnitureType::Nightstand),
        });
        assert!(store.pending_tasks().iter().any(|t| t.id == id && !t.completed));
        assert!(store.complete_item(&id));
        assert_eq!(store.completed_items().len(), 2);
        assert!(store.completed_items().iter().all(|i| i.completed));
        assert_eq!(store.progress(), 55);
    }

    #[test]
    fn added_tasks_get_distinct_ids() {
        let mut store = PalaceStore::new();
        let task = NewTask {
            title: "x".into(),
            description: String::new(),
            category: None,
        };
        let a = store.add_pending_task(task.clone());
        let b = store.add_pending_task(task);
        assert_ne!(a, b);
        assert_eq!(store.pending_tasks().len(), 4);
    }

    #[test]
    fn most_visited_orders_by_count_then_declaration() {
        let mut store = PalaceStore::new();
        store.select_furniture(Some(FurnitureType::Chair));
        store.select_furniture(Some(FurnitureType::Chair));
        store.select_furniture(Some(FurnitureType::Wardrobe));
        let top: Vec<FurnitureType> = store.most_visited(3).iter().map(|s| s.furniture).collect();
        assert_eq!(top, vec![FurnitureType::Chair, FurnitureType::Wardrobe, FurnitureType::Bed]);
    }

    #[test]
    fn snapshot_serializes_with_snake_case_tags() {
        let mut store = PalaceStore::new();
        store.select_furniture(Some(FurnitureType::Nightstand));
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["selected_furniture"], "nightstand");
        assert_eq!(json["furniture_stats"]["nightstand"]["interactions"], 1);
        assert_eq!(json["progress"], 25);
    }

    #[test]
    fn snapshot_carries_legend_and_most_visited() {
        let mut store = PalaceStore::new();
        store.select_furniture(Some(FurnitureType::Shelf));
        let snap = store.snapshot();
        assert_eq!(snap.legend.len(), 6);
        let shelf = snap.legend.iter().find(|e| e.furniture == FurnitureType::Shelf).unwrap();
        assert_eq!(shelf.icon, "🔖");
        assert_eq!(shelf.name, "Estantería");
        assert_eq!(shelf.area_label, "Logros");
        assert_eq!(snap.most_visited.len(), MOST_VISITED_SHOWN);
        assert_eq!(snap.most_visited[0].furniture, FurnitureType::Shelf);
        assert_eq!(snap.most_visited[0].interactions, 1);
    }
}
