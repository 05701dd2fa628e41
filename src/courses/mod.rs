mod config;
pub mod questions;

pub use config::{
    config_file_path, ensure_workspace_structure, load_or_default, save, workspace_root,
    AppConfig, ImportSettings, SessionSettings, WorkspacePaths,
};
pub use questions::{
    AnswerStatus, NewQuestion, Question, QuestionImage, QuestionPatch,
};

use crate::activity::{ActivityLog, EventType};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use uuid::Uuid;

/// A course owning a collection of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Manages courses, configuration, and the file-backed stores.
///
/// Plays the role of the document database the rest of the crate is written
/// against: every course is a directory under the workspace with a
/// `course.json` metadata file, a `questions.json` collection, and an
/// `events.jsonl` activity log. Writes are last-write-wins per document.
pub struct CourseManager {
    pub config: AppConfig,
    pub paths: WorkspacePaths,
}

impl CourseManager {
    pub fn new() -> Result<Self> {
        let paths = ensure_workspace_structure()?;
        let config = config::load_or_default()?;
        Ok(Self { config, paths })
    }

    pub fn create_course(&self, title: &str, description: &str) -> Result<Course> {
        if title.trim().is_empty() {
            return Err(Error::Validation("course title must not be empty".into()));
        }
        if description.trim().is_empty() {
            return Err(Error::Validation(
                "course description must not be empty".into(),
            ));
        }
        let course = Course {
            course_id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            slug: slugify(title),
            created_at: Utc::now(),
        };
        self.persist_course(&course)?;
        ActivityLog::for_course(&self.paths, course.course_id).append(
            course.course_id,
            EventType::CourseCreated,
            json!({ "title": course.title, "slug": course.slug }),
        )?;
        Ok(course)
    }

    fn persist_course(&self, course: &Course) -> Result<()> {
        let dir = self.paths.course_dir(&course.course_id);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("course.json"), serde_json::to_vec_pretty(course)?)?;
        Ok(())
    }

    pub fn list_courses(&self) -> Result<Vec<Course>> {
        let mut courses = Vec::new();
        if self.paths.courses_dir.exists() {
            for entry in fs::read_dir(&self.paths.courses_dir)? {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    let metadata = entry.path().join("course.json");
                    if metadata.exists() {
                        let course: Course = serde_json::from_slice(&fs::read(&metadata)?)?;
                        courses.push(course);
                    }
                }
            }
        }
        courses.sort_by_key(|c| c.created_at);
        Ok(courses)
    }

    pub fn get_course(&self, course_id: Uuid) -> Result<Course> {
        let metadata = self.paths.course_dir(&course_id).join("course.json");
        if !metadata.exists() {
            return Err(Error::not_found("course", course_id));
        }
        let course: Course = serde_json::from_slice(&fs::read(&metadata)?)?;
        Ok(course)
    }

    pub fn delete_course(&self, course_id: Uuid) -> Result<()> {
        let dir = self.paths.course_dir(&course_id);
        if !dir.join("course.json").exists() {
            return Err(Error::not_found("course", course_id));
        }
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    /// Activity log for a course, usable by the import pipeline and the
    /// session engine.
    pub fn activity_log(&self, course_id: Uuid) -> ActivityLog {
        ActivityLog::for_course(&self.paths, course_id)
    }
}

/// Create a filesystem-safe slug from a course title.
fn slugify(name: &str) -> String {
    let mut slug = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>();
    while slug.contains("--") {
        slug = slug.replace("--", "-");
    }
    slug.trim_matches('-').to_string()
}
