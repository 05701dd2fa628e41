//! Per-user course statistics: point accumulators and badge sets.
//!
//! One JSON document per user under `stats/`, holding a record per course.
//! Points only ever grow, badges are an append-only set, and the level is
//! recomputed from points on every read.

pub mod policy;

pub use policy::{
    badges_for_points, completion_bonus, level_for_points, BADGE_TIERS,
    POINTS_PER_CORRECT_ANSWER,
};

use crate::courses::CourseManager;
use crate::error::Result;
use crate::store::StatsStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

/// Stats exposed to callers; `level` is derived, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCourseStats {
    pub user_id: String,
    pub course_id: Uuid,
    pub points: u64,
    pub badges: Vec<String>,
    pub level: u8,
}

/// Persisted per-course record inside a user's stats document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CourseStatsRecord {
    course_id: Uuid,
    points: u64,
    badges: Vec<String>,
    updated_at: DateTime<Utc>,
}

impl CourseStatsRecord {
    fn new(course_id: Uuid) -> Self {
        Self {
            course_id,
            points: 0,
            badges: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    fn to_stats(&self, user_id: &str) -> UserCourseStats {
        UserCourseStats {
            user_id: user_id.to_string(),
            course_id: self.course_id,
            points: self.points,
            badges: self.badges.clone(),
            level: policy::level_for_points(self.points),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserStatsDocument {
    user_id: String,
    #[serde(default)]
    courses: Vec<CourseStatsRecord>,
}

impl CourseManager {
    fn stats_path(&self, user_id: &str) -> PathBuf {
        self.paths.stats_dir.join(format!("{}.json", file_key(user_id)))
    }

    fn load_stats_document(&self, user_id: &str) -> Result<UserStatsDocument> {
        let path = self.stats_path(user_id);
        if path.exists() {
            let doc: UserStatsDocument = serde_json::from_slice(&fs::read(path)?)?;
            Ok(doc)
        } else {
            Ok(UserStatsDocument {
                user_id: user_id.to_string(),
                courses: Vec::new(),
            })
        }
    }

    fn save_stats_document(&self, user_id: &str, doc: &UserStatsDocument) -> Result<()> {
        fs::create_dir_all(&self.paths.stats_dir)?;
        fs::write(self.stats_path(user_id), serde_json::to_vec_pretty(doc)?)?;
        Ok(())
    }

    fn with_course_record<T>(
        &self,
        user_id: &str,
        course_id: Uuid,
        apply: impl FnOnce(&mut CourseStatsRecord) -> T,
    ) -> Result<T> {
        let mut doc = self.load_stats_document(user_id)?;
        let record = match doc.courses.iter_mut().find(|r| r.course_id == course_id) {
            Some(record) => record,
            None => {
                doc.courses.push(CourseStatsRecord::new(course_id));
                doc.courses.last_mut().expect("record just pushed")
            }
        };
        record.updated_at = Utc::now();
        let value = apply(record);
        self.save_stats_document(user_id, &doc)?;
        Ok(value)
    }
}

impl StatsStore for CourseManager {
    fn add_points(&self, user_id: &str, course_id: Uuid, delta: u64) -> Result<u64> {
        self.with_course_record(user_id, course_id, |record| {
            record.points += delta;
            record.points
        })
    }

    fn add_badge(&self, user_id: &str, course_id: Uuid, badge: &str) -> Result<bool> {
        self.with_course_record(user_id, course_id, |record| {
            if record.badges.iter().any(|b| b == badge) {
                false
            } else {
                record.badges.push(badge.to_string());
                true
            }
        })
    }

    fn course_stats(&self, user_id: &str, course_id: Uuid) -> Result<UserCourseStats> {
        let doc = self.load_stats_document(user_id)?;
        let stats = doc
            .courses
            .iter()
            .find(|r| r.course_id == course_id)
            .map(|r| r.to_stats(user_id))
            .unwrap_or_else(|| CourseStatsRecord::new(course_id).to_stats(user_id));
        Ok(stats)
    }

    fn all_course_stats(&self, user_id: &str) -> Result<Vec<UserCourseStats>> {
        let doc = self.load_stats_document(user_id)?;
        Ok(doc.courses.iter().map(|r| r.to_stats(user_id)).collect())
    }
}

/// Filesystem-safe key for a user's stats document.
fn file_key(user_id: &str) -> String {
    user_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}
