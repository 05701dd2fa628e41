//! Append-only activity log kept per course.
//!
//! Every import, session, and scoring action appends one structured event
//! to `events.jsonl` under the course directory. The log is the audit
//! surface for "why did this user get that badge" style questions.

use crate::courses::WorkspacePaths;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CourseCreated,
    QuestionAdded,
    QuestionDeleted,
    ImportStarted,
    ImportRowSkipped,
    ImportCompleted,
    SessionStarted,
    AnswerEvaluated,
    BadgeAwarded,
    ExamTimerExpired,
    SessionCompleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub event_id: Uuid,
    pub course_id: Uuid,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

/// JSONL-backed event log for one course.
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn for_course(paths: &WorkspacePaths, course_id: Uuid) -> Self {
        Self {
            path: paths.course_dir(&course_id).join("events.jsonl"),
        }
    }

    pub fn append(
        &self,
        course_id: Uuid,
        event_type: EventType,
        details: serde_json::Value,
    ) -> Result<Uuid> {
        let event = ActivityEvent {
            event_id: Uuid::new_v4(),
            course_id,
            event_type,
            timestamp: Utc::now(),
            details,
        };
        self.append_event(&event)?;
        Ok(event.event_id)
    }

    pub fn append_event(&self, event: &ActivityEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(serde_json::to_string(event)?.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    pub fn read_events(&self) -> Result<Vec<ActivityEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        let mut events = Vec::new();
        for line in data.lines().filter(|l| !l.trim().is_empty()) {
            let event: ActivityEvent = serde_json::from_str(line)?;
            events.push(event);
        }
        Ok(events)
    }
}
