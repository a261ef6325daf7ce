//! Sled-backed record store: local implementation of the relational-store contract
//! (profiles, courses, modules, enrollments, palaces, study plans).
//!
//! One sled tree per table, JSON values. Composite keys keep prefix scans ordered:
//!
//! | Tree | Key |
//! |------|-----|
//! | `profiles` | `{user_id}` |
//! | `courses` | `{course_id}` |
//! | `course_modules` | `{course_id}/{order_index:08}/{module_id}` |
//! | `enrollments` | `{student_id}/{course_id}` |
//! | `mental_palaces` | `{student_id}/{course_id}` |
//! | `study_plans` | `{palace_id}/{module_id}` |

use crate::error::{PalaceError, PalaceResult};
use crate::records::{
    AppRole, Course, CourseModule, Enrollment, MentalPalace, Profile, RoomType, StudyPlanRecord,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

const TREE_PROFILES: &str = "profiles";
const TREE_COURSES: &str = "courses";
const TREE_MODULES: &str = "course_modules";
const TREE_ENROLLMENTS: &str = "enrollments";
const TREE_PALACES: &str = "mental_palaces";
const TREE_STUDY_PLANS: &str = "study_plans";

/// Course creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub room_type: RoomType,
    pub modules: Vec<NewModule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewModule {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Syllabus,
    Content,
}

pub struct RecordStore {
    db: sled::Db,
}

impl RecordStore {
    /// Opens or creates the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> PalaceResult<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn tree(&self, name: &str) -> PalaceResult<sled::Tree> {
        Ok(self.db.open_tree(name)?)
    }

    fn put<T: Serialize>(&self, tree: &str, key: &str, value: &T) -> PalaceResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.tree(tree)?.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, tree: &str, key: &str) -> PalaceResult<Option<T>> {
        match self.tree(tree)?.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, tree: &str, prefix: &str) -> PalaceResult<Vec<T>> {
        self.tree(tree)?
            .scan_prefix(prefix.as_bytes())
            .map(|entry| -> PalaceResult<T> {
                let (_, v) = entry?;
                Ok(serde_json::from_slice(&v)?)
            })
            .collect()
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> PalaceResult<()> {
        self.db.flush()?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Profiles
    // -------------------------------------------------------------------------

    pub fn get_profile(&self, user_id: &str) -> PalaceResult<Option<Profile>> {
        self.get(TREE_PROFILES, user_id)
    }

    pub fn upsert_profile(&self, profile: &Profile) -> PalaceResult<()> {
        self.put(TREE_PROFILES, &profile.user_id, profile)
    }

    /// Existing profile, or a new student profile (persisted).
    pub fn ensure_profile(&self, user_id: &str) -> PalaceResult<Profile> {
        if let Some(p) = self.get_profile(user_id)? {
            return Ok(p);
        }
        let profile = Profile::new(user_id);
        self.upsert_profile(&profile)?;
        Ok(profile)
    }

    pub fn set_role(&self, user_id: &str, role: AppRole) -> PalaceResult<Profile> {
        let mut profile = self.ensure_profile(user_id)?;
        profile.role = role;
        profile.updated_at = Some(Utc::now());
        self.upsert_profile(&profile)?;
        Ok(profile)
    }

    // -------------------------------------------------------------------------
    // Courses and modules
    // -------------------------------------------------------------------------

    /// Create a course and its modules. Only professors may create courses.
    pub fn create_course(
        &self,
        professor_id: &str,
        new: NewCourse,
    ) -> PalaceResult<(Course, Vec<CourseModule>)> {
        let profile = self
            .get_profile(professor_id)?
            .ok_or_else(|| PalaceError::NotFound(format!("profile {}", professor_id)))?;
        if profile.role != AppRole::Professor {
            return Err(PalaceError::Forbidden("only professors can create courses".into()));
        }
        if new.title.trim().is_empty() {
            return Err(PalaceError::Validation("El título del curso es requerido".into()));
        }
        if new.modules.is_empty() {
            return Err(PalaceError::Validation("El curso necesita al menos un módulo".into()));
        }
        if new.modules.iter().any(|m| m.title.trim().is_empty()) {
            return Err(PalaceError::Validation("Todos los módulos deben tener un título".into()));
        }

        let now = Utc::now();
        let course = Course {
            id: uuid::Uuid::new_v4().to_string(),
            professor_id: professor_id.to_string(),
            title: new.title.trim().to_string(),
            description: new.description,
            room_type: new.room_type,
            syllabus_url: None,
            content_urls: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.put(TREE_COURSES, &course.id, &course)?;

        let mut modules = Vec::with_capacity(new.modules.len());
        for (index, m) in new.modules.into_iter().enumerate() {
            let module = CourseModule {
                id: uuid::Uuid::new_v4().to_string(),
                course_id: course.id.clone(),
                title: m.title.trim().to_string(),
                description: m.description,
                content: m.content,
                order_index: index as u32,
            };
            self.put(TREE_MODULES, &module_key(&module), &module)?;
            modules.push(module);
        }

        tracing::info!(
            target: "palace::records",
            course_id = %course.id,
            modules = modules.len(),
            "Course created"
        );
        Ok((course, modules))
    }

    pub fn get_course(&self, course_id: &str) -> PalaceResult<Option<Course>> {
        self.get(TREE_COURSES, course_id)
    }

    fn require_course(&self, course_id: &str) -> PalaceResult<Course> {
        self.get_course(course_id)?
            .ok_or_else(|| PalaceError::NotFound(format!("course {}", course_id)))
    }

    /// All courses, newest first.
    pub fn list_courses(&self) -> PalaceResult<Vec<Course>> {
        let mut courses: Vec<Course> = self.scan(TREE_COURSES, "")?;
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(courses)
    }

    pub fn courses_by_professor(&self, professor_id: &str) -> PalaceResult<Vec<Course>> {
        Ok(self
            .list_courses()?
            .into_iter()
            .filter(|c| c.professor_id == professor_id)
            .collect())
    }

    /// Modules of a course ordered by `order_index`.
    pub fn list_modules(&self, course_id: &str) -> PalaceResult<Vec<CourseModule>> {
        self.scan(TREE_MODULES, &prefix_key(course_id)?)
    }

    /// Record uploaded material URLs on a course owned by `professor_id`.
    pub fn attach_materials(
        &self,
        course_id: &str,
        professor_id: &str,
        kind: MaterialKind,
        urls: Vec<String>,
    ) -> PalaceResult<Course> {
        let mut course = self.require_course(course_id)?;
        if course.professor_id != professor_id {
            return Err(PalaceError::Forbidden("course belongs to another professor".into()));
        }
        if urls.is_empty() {
            return Err(PalaceError::Validation("no files uploaded".into()));
        }
        match kind {
            MaterialKind::Syllabus => course.syllabus_url = urls.into_iter().next(),
            MaterialKind::Content => course.content_urls.extend(urls),
        }
        course.updated_at = Utc::now();
        self.put(TREE_COURSES, &course.id, &course)?;
        Ok(course)
    }

    // -------------------------------------------------------------------------
    // Enrollments and palaces
    // -------------------------------------------------------------------------

    /// Enroll a student; creates the student's palace for the course. Idempotent.
    pub fn enroll(&self, student_id: &str, course_id: &str) -> PalaceResult<(Enrollment, MentalPalace)> {
        self.require_course(course_id)?;
        let key = pair_key(student_id, course_id)?;
        let enrollment = match self.get::<Enrollment>(TREE_ENROLLMENTS, &key)? {
            Some(existing) => existing,
            None => {
                let enrollment = Enrollment {
                    id: uuid::Uuid::new_v4().to_string(),
                    course_id: course_id.to_string(),
                    student_id: student_id.to_string(),
                    enrolled_at: Utc::now(),
                };
                self.put(TREE_ENROLLMENTS, &key, &enrollment)?;
                tracing::info!(target: "palace::records", student_id, course_id, "Student enrolled");
                enrollment
            }
        };
        let palace = self.find_or_create_palace(student_id, course_id)?;
        Ok((enrollment, palace))
    }

    pub fn enrollments_for(&self, student_id: &str) -> PalaceResult<Vec<Enrollment>> {
        self.scan(TREE_ENROLLMENTS, &prefix_key(student_id)?)
    }

    pub fn is_enrolled(&self, student_id: &str, course_id: &str) -> PalaceResult<bool> {
        Ok(self
            .tree(TREE_ENROLLMENTS)?
            .contains_key(pair_key(student_id, course_id)?.as_bytes())?)
    }

    /// Read-only lookup of the student's palace for a course.
    pub fn find_palace(&self, student_id: &str, course_id: &str) -> PalaceResult<Option<MentalPalace>> {
        self.get(TREE_PALACES, &pair_key(student_id, course_id)?)
    }

    pub fn find_or_create_palace(&self, student_id: &str, course_id: &str) -> PalaceResult<MentalPalace> {
        if let Some(p) = self.find_palace(student_id, course_id)? {
            return Ok(p);
        }
        let key = pair_key(student_id, course_id)?;
        let palace = MentalPalace {
            id: uuid::Uuid::new_v4().to_string(),
            course_id: course_id.to_string(),
            student_id: student_id.to_string(),
            palace_config: serde_json::json!({}),
            created_at: Utc::now(),
        };
        self.put(TREE_PALACES, &key, &palace)?;
        Ok(palace)
    }

    // -------------------------------------------------------------------------
    // Study plans
    // -------------------------------------------------------------------------

    pub fn study_plans(&self, palace_id: &str) -> PalaceResult<Vec<StudyPlanRecord>> {
        self.scan(TREE_STUDY_PLANS, &prefix_key(palace_id)?)
    }

    pub fn insert_study_plan(&self, plan: &StudyPlanRecord) -> PalaceResult<()> {
        self.put(TREE_STUDY_PLANS, &pair_key(&plan.palace_id, &plan.module_id)?, plan)
    }
}

fn module_key(m: &CourseModule) -> String {
    format!("{}/{:08}/{}", m.course_id, m.order_index, m.id)
}

/// Ids become key segments: they must be non-empty and free of the `/` separator,
/// otherwise a prefix scan for `s1/` would also match `s1/x/...`.
fn key_part(id: &str) -> PalaceResult<&str> {
    if id.is_empty() || id.contains('/') {
        return Err(PalaceError::Validation(format!("invalid id {:?}", id)));
    }
    Ok(id)
}

fn pair_key(a: &str, b: &str) -> PalaceResult<String> {
    Ok(format!("{}/{}", key_part(a)?, key_part(b)?))
}

fn prefix_key(id: &str) -> PalaceResult<String> {
    Ok(format!("{}/", key_part(id)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("records")).unwrap();
        (dir, store)
    }

    fn new_course(titles: &[&str]) -> NewCourse {
        NewCourse {
            title: "Historia del Arte".into(),
            description: Some("Curso introductorio".into()),
            room_type: RoomType::Library,
            modules: titles
                .iter()
                .map(|t| NewModule {
                    title: t.to_string(),
                    description: None,
                    content: None,
                })
                .collect(),
        }
    }

    #[test]
    fn students_cannot_create_courses() {
        let (_dir, store) = store();
        store.ensure_profile("s1").unwrap();
        let err = store.create_course("s1", new_course(&["Intro"])).unwrap_err();
        assert!(matches!(err, PalaceError::Forbidden(_)));
    }

    #[test]
    fn course_validation_rejects_blank_titles() {
        let (_dir, store) = store();
        store.set_role("prof", AppRole::Professor).unwrap();
        let mut course = new_course(&["Intro"]);
        course.title = "  ".into();
        assert!(matches!(store.create_course("prof", course), Err(PalaceError::Validation(_))));
        assert!(matches!(
            store.create_course("prof", new_course(&["Intro", ""])),
            Err(PalaceError::Validation(_))
        ));
        assert!(matches!(
            store.create_course("prof", new_course(&[])),
            Err(PalaceError::Validation(_))
        ));
    }

    #[test]
    fn modules_come_back_in_order() {
        let (_dir, store) = store();
        store.set_role("prof", AppRole::Professor).unwrap();
        let titles: Vec<String> = (0..12).map(|i| format!("Módulo {}", i)).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let (course, _) = store.create_course("prof", new_course(&refs)).unwrap();

        let modules = store.list_modules(&course.id).unwrap();
        assert_eq!(modules.len(), 12);
        for (i, m) in modules.iter().enumerate() {
            assert_eq!(m.order_index as usize, i);
            assert_eq!(m.title, format!("Módulo {}", i));
        }
        assert_eq!(store.courses_by_professor("prof").unwrap().len(), 1);
    }

    #[test]
    fn enrollment_is_idempotent_and_creates_one_palace() {
        let (_dir, store) = store();
        store.set_role("prof", AppRole::Professor).unwrap();
        let (course, _) = store.create_course("prof", new_course(&["Intro"])).unwrap();

        let (e1, p1) = store.enroll("s1", &course.id).unwrap();
        let (e2, p2) = store.enroll("s1", &course.id).unwrap();
        assert_eq!(e1.id, e2.id);
        assert_eq!(p1.id, p2.id);
        assert!(store.is_enrolled("s1", &course.id).unwrap());
        assert_eq!(store.enrollments_for("s1").unwrap().len(), 1);
        assert!(matches!(store.enroll("s1", "missing"), Err(PalaceError::NotFound(_))));
    }

    #[test]
    fn ids_with_separator_are_rejected() {
        let (_dir, store) = store();
        store.set_role("prof", AppRole::Professor).unwrap();
        let (course, _) = store.create_course("prof", new_course(&["Intro"])).unwrap();
        store.enroll("s1", &course.id).unwrap();

        assert!(matches!(store.enroll("s1/x", &course.id), Err(PalaceError::Validation(_))));
        assert!(matches!(store.enrollments_for("s1/"), Err(PalaceError::Validation(_))));
        assert!(matches!(store.is_enrolled("", &course.id), Err(PalaceError::Validation(_))));
        assert_eq!(store.enrollments_for("s1").unwrap().len(), 1);
    }

    #[test]
    fn flushed_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records");
        let course_id = {
            let store = RecordStore::open(&path).unwrap();
            store.set_role("prof", AppRole::Professor).unwrap();
            let (course, _) = store.create_course("prof", new_course(&["Intro"])).unwrap();
            store.flush().unwrap();
            course.id
        };
        let store = RecordStore::open(&path).unwrap();
        assert_eq!(store.get_course(&course_id).unwrap().unwrap().title, "Historia del Arte");
        assert_eq!(store.list_modules(&course_id).unwrap().len(), 1);
    }

    #[test]
    fn find_palace_does_not_create() {
        let (_dir, store) = store();
        assert!(store.find_palace("s1", "c1").unwrap().is_none());
        assert!(store.find_palace("s1", "c1").unwrap().is_none());
        let created = store.find_or_create_palace("s1", "c1").unwrap();
        assert_eq!(store.find_palace("s1", "c1").unwrap().map(|p| p.id), Some(created.id));
    }

    #[test]
    fn materials_attach_by_kind() {
        let (_dir, store) = store();
        store.set_role("prof", AppRole::Professor).unwrap();
        let (course, _) = store.create_course("prof", new_course(&["Intro"])).unwrap();

        let c = store
            .attach_materials(&course.id, "prof", MaterialKind::Syllabus, vec!["a.pdf".into(), "b.pdf".into()])
            .unwrap();
        assert_eq!(c.syllabus_url.as_deref(), Some("a.pdf"));
        assert!(c.content_urls.is_empty());

        store
            .attach_materials(&course.id, "prof", MaterialKind::Content, vec!["c.pdf".into()])
            .unwrap();
        let c = store
            .attach_materials(&course.id, "prof", MaterialKind::Content, vec!["d.pdf".into()])
            .unwrap();
        assert_eq!(c.content_urls, vec!["c.pdf".to_string(), "d.pdf".to_string()]);

        assert!(matches!(
            store.attach_materials(&course.id, "other", MaterialKind::Content, vec!["x".into()]),
            Err(PalaceError::Forbidden(_))
        ));
    }
}
