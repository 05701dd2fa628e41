//! Store capabilities consumed by the import pipeline and session engine.
//!
//! The core never reaches for a global client; callers hand in whatever
//! implements these traits. `CourseManager` provides the file-backed
//! reference implementation.

use crate::courses::{NewQuestion, Question, QuestionPatch};
use crate::error::Result;
use crate::stats::UserCourseStats;
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

/// Document collection of questions keyed by course.
pub trait QuestionStore {
    fn questions(&self, course_id: Uuid) -> Result<Vec<Question>>;
    fn add_question(&self, course_id: Uuid, record: NewQuestion) -> Result<Question>;
    fn update_question(
        &self,
        course_id: Uuid,
        question_id: Uuid,
        patch: QuestionPatch,
    ) -> Result<Question>;
    fn delete_question(&self, course_id: Uuid, question_id: Uuid) -> Result<()>;
    /// Questions flagged for review regardless of their last outcome.
    fn saved_questions(&self, course_id: Uuid) -> Result<Vec<Question>>;
    /// Questions whose most recent answer was wrong.
    fn incorrect_questions(&self, course_id: Uuid) -> Result<Vec<Question>>;
}

/// Per-user, per-course point and badge accumulator.
pub trait StatsStore {
    /// Adds `delta` points and returns the new persisted total.
    fn add_points(&self, user_id: &str, course_id: Uuid, delta: u64) -> Result<u64>;
    /// Appends a badge if absent. Returns `true` when newly added.
    fn add_badge(&self, user_id: &str, course_id: Uuid, badge: &str) -> Result<bool>;
    fn course_stats(&self, user_id: &str, course_id: Uuid) -> Result<UserCourseStats>;
    fn all_course_stats(&self, user_id: &str) -> Result<Vec<UserCourseStats>>;
}

/// Byte sink for externally hosted question images.
pub trait BlobStore {
    /// Stores `bytes` under `destination` and returns a resolvable URL.
    fn upload(&self, bytes: &[u8], destination: &str) -> Result<String>;
}

/// Blob store writing into the workspace `media/` directory and handing
/// back `file://` URLs. Stands in for a hosted bucket.
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BlobStore for FileBlobStore {
    fn upload(&self, bytes: &[u8], destination: &str) -> Result<String> {
        let target = self.root.join(destination);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
        Ok(format!("file://{}", target.display()))
    }
}
