//! Question records and the file-backed question store.
//!
//! Questions belong to exactly one course and live in a single
//! `questions.json` document under the course directory. The answer key is
//! normalized to an index into `options` when a question is created; the
//! session engine never re-interprets answer letters at scoring time.

use crate::activity::{ActivityLog, EventType};
use crate::error::{Error, Result};
use crate::store::QuestionStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use uuid::Uuid;

use super::CourseManager;

/// Outcome of the most recent answer attempt on a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Correct,
    Incorrect,
}

/// Image attached to a question, either inlined or externally hosted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum QuestionImage {
    /// Self-describing `data:<mime>;base64,<payload>` URI.
    DataUri(String),
    /// URL resolved by the blob store at import time.
    Url(String),
}

/// A single multiple-choice question stored in a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question_id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    /// Index of the correct entry in `options`.
    pub answer_index: usize,
    #[serde(default)]
    pub image: Option<QuestionImage>,
    #[serde(default)]
    pub last_status: Option<AnswerStatus>,
    #[serde(default)]
    pub is_saved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    /// The option string the answer key resolves to.
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.answer_index).map(String::as_str)
    }
}

/// Payload for creating a question (manual entry or import).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub answer_index: usize,
    #[serde(default)]
    pub image: Option<QuestionImage>,
}

impl NewQuestion {
    fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::Validation("question text must not be empty".into()));
        }
        if self.options.len() < 2 {
            return Err(Error::Validation(
                "a question needs at least two options".into(),
            ));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err(Error::Validation("options must not be empty".into()));
        }
        if self.answer_index >= self.options.len() {
            return Err(Error::Validation(format!(
                "answer index {} out of bounds for {} options",
                self.answer_index,
                self.options.len()
            )));
        }
        Ok(())
    }
}

/// Partial update applied to a stored question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionPatch {
    #[serde(default)]
    pub last_status: Option<AnswerStatus>,
    #[serde(default)]
    pub is_saved: Option<bool>,
}

impl QuestionPatch {
    pub fn status(correct: bool) -> Self {
        Self {
            last_status: Some(if correct {
                AnswerStatus::Correct
            } else {
                AnswerStatus::Incorrect
            }),
            is_saved: None,
        }
    }

    pub fn saved(is_saved: bool) -> Self {
        Self {
            last_status: None,
            is_saved: Some(is_saved),
        }
    }
}

impl CourseManager {
    pub(crate) fn load_questions(&self, course_id: &Uuid) -> Result<Vec<Question>> {
        let path = self.paths.course_dir(course_id).join("questions.json");
        if path.exists() {
            let questions: Vec<Question> = serde_json::from_slice(&fs::read(path)?)?;
            Ok(questions)
        } else {
            Ok(Vec::new())
        }
    }

    pub(crate) fn save_questions(&self, course_id: &Uuid, questions: &[Question]) -> Result<()> {
        let dir = self.paths.course_dir(course_id);
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join("questions.json"),
            serde_json::to_vec_pretty(questions)?,
        )?;
        Ok(())
    }
}

impl QuestionStore for CourseManager {
    fn questions(&self, course_id: Uuid) -> Result<Vec<Question>> {
        self.get_course(course_id)?;
        self.load_questions(&course_id)
    }

    fn add_question(&self, course_id: Uuid, record: NewQuestion) -> Result<Question> {
        self.get_course(course_id)?;
        record.validate()?;
        let now = Utc::now();
        let question = Question {
            question_id: Uuid::new_v4(),
            text: record.text,
            options: record.options,
            answer_index: record.answer_index,
            image: record.image,
            last_status: None,
            is_saved: false,
            created_at: now,
            updated_at: now,
        };
        let mut questions = self.load_questions(&course_id)?;
        questions.push(question.clone());
        self.save_questions(&course_id, &questions)?;
        ActivityLog::for_course(&self.paths, course_id).append(
            course_id,
            EventType::QuestionAdded,
            json!({ "question_id": question.question_id }),
        )?;
        Ok(question)
    }

    fn update_question(
        &self,
        course_id: Uuid,
        question_id: Uuid,
        patch: QuestionPatch,
    ) -> Result<Question> {
        let mut questions = self.load_questions(&course_id)?;
        let question = questions
            .iter_mut()
            .find(|q| q.question_id == question_id)
            .ok_or_else(|| Error::not_found("question", question_id))?;
        if let Some(status) = patch.last_status {
            question.last_status = Some(status);
        }
        if let Some(is_saved) = patch.is_saved {
            question.is_saved = is_saved;
        }
        question.updated_at = Utc::now();
        let updated = question.clone();
        self.save_questions(&course_id, &questions)?;
        Ok(updated)
    }

    fn delete_question(&self, course_id: Uuid, question_id: Uuid) -> Result<()> {
        let mut questions = self.load_questions(&course_id)?;
        let before = questions.len();
        questions.retain(|q| q.question_id != question_id);
        if questions.len() == before {
            return Err(Error::not_found("question", question_id));
        }
        self.save_questions(&course_id, &questions)?;
        ActivityLog::for_course(&self.paths, course_id).append(
            course_id,
            EventType::QuestionDeleted,
            json!({ "question_id": question_id }),
        )?;
        Ok(())
    }

    fn saved_questions(&self, course_id: Uuid) -> Result<Vec<Question>> {
        Ok(self
            .questions(course_id)?
            .into_iter()
            .filter(|q| q.is_saved)
            .collect())
    }

    fn incorrect_questions(&self, course_id: Uuid) -> Result<Vec<Question>> {
        Ok(self
            .questions(course_id)?
            .into_iter()
            .filter(|q| q.last_status == Some(AnswerStatus::Incorrect))
            .collect())
    }
}
