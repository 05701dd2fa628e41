//! Workbook import pipeline.
//!
//! Turns an uploaded spreadsheet buffer into validated, persisted question
//! records. Row-level problems never abort the run: the offending row is
//! skipped, the reason lands in the summary and the activity log, and the
//! pipeline moves on. Only a workbook with zero usable rows is an error.

mod drawings;
mod sheet;

use crate::activity::{ActivityLog, EventType};
use crate::courses::{ImportSettings, NewQuestion, Question, QuestionImage};
use crate::error::{Error, Result};
use crate::store::{BlobStore, QuestionStore};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Marker inserted into the question text where the image belongs.
pub const IMAGE_PLACEHOLDER: &str = "[image]";

/// Why a row was skipped during import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportIssueReason {
    EmptyQuestionText,
    WrongOptionCount,
    InvalidAnswerKey,
}

/// One skipped row with its sheet position and reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportIssue {
    /// One-based sheet row number.
    pub row: u32,
    pub reason: ImportIssueReason,
    pub message: String,
}

impl ImportIssue {
    fn new(row: u32, reason: ImportIssueReason, message: impl Into<String>) -> Self {
        Self {
            row,
            reason,
            message: message.into(),
        }
    }
}

/// Counts and issues of one import run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub imported: usize,
    pub skipped: usize,
    pub issues: Vec<ImportIssue>,
}

/// Persisted questions plus the run summary.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub questions: Vec<Question>,
    pub summary: ImportSummary,
}

/// Imports a workbook buffer into a course.
///
/// Rows are persisted one by one in sheet order; rows written before a
/// later store failure stay written (at-least-once, non-atomic). When a
/// blob store is given and `settings.inline_images` is off, row images are
/// uploaded and referenced by URL; otherwise they are inlined as data URIs.
pub fn import_workbook(
    questions: &dyn QuestionStore,
    log: &ActivityLog,
    course_id: Uuid,
    bytes: &[u8],
    blob: Option<&dyn BlobStore>,
    settings: &ImportSettings,
) -> Result<ImportOutcome> {
    let max_bytes = settings.max_file_size_mb * 1024 * 1024;
    if bytes.len() as u64 > max_bytes {
        return Err(Error::Validation(format!(
            "workbook exceeds the {} MB upload limit",
            settings.max_file_size_mb
        )));
    }

    let rows = sheet::read_first_sheet(bytes)?;
    let mut images = drawings::extract_anchored_images(bytes)?;
    log.append(
        course_id,
        EventType::ImportStarted,
        json!({ "rows": rows.len(), "images": images.len() }),
    )?;

    let mut outcome = ImportOutcome {
        questions: Vec::new(),
        summary: ImportSummary::default(),
    };

    for row in rows {
        outcome.summary.total_rows += 1;
        let record = match validate_row(&row) {
            Ok(record) => record,
            Err(issue) => {
                log.append(
                    course_id,
                    EventType::ImportRowSkipped,
                    json!({ "row": issue.row, "reason": issue.reason, "message": issue.message }),
                )?;
                outcome.summary.skipped += 1;
                outcome.summary.issues.push(issue);
                continue;
            }
        };

        // One image per question; the first anchored match is consumed so a
        // later row can never claim the same picture.
        let mut record = record;
        if let Some(pos) = images.iter().position(|img| img.sheet_row == row.row) {
            let image = images.remove(pos);
            record.text = insert_image_placeholder(&record.text);
            record.image = Some(encode_image(course_id, row.row, &image, blob, settings)?);
        }

        let question = questions.add_question(course_id, record)?;
        outcome.summary.imported += 1;
        outcome.questions.push(question);
    }

    if outcome.questions.is_empty() {
        return Err(Error::EmptyWorkbook);
    }

    log.append(
        course_id,
        EventType::ImportCompleted,
        json!({
            "total_rows": outcome.summary.total_rows,
            "imported": outcome.summary.imported,
            "skipped": outcome.summary.skipped
        }),
    )?;
    Ok(outcome)
}

fn validate_row(row: &sheet::SheetRow) -> std::result::Result<NewQuestion, ImportIssue> {
    if row.question.is_empty() {
        return Err(ImportIssue::new(
            row.row,
            ImportIssueReason::EmptyQuestionText,
            "question text is empty",
        ));
    }
    if row.options.len() != 4 {
        return Err(ImportIssue::new(
            row.row,
            ImportIssueReason::WrongOptionCount,
            format!("expected 4 options, found {}", row.options.len()),
        ));
    }
    let answer_index = match resolve_answer_letter(&row.answer) {
        Some(index) if index < row.options.len() => index,
        _ => {
            return Err(ImportIssue::new(
                row.row,
                ImportIssueReason::InvalidAnswerKey,
                format!("answer {:?} is not one of A-D", row.answer),
            ));
        }
    };
    Ok(NewQuestion {
        text: row.question.clone(),
        options: row.options.clone(),
        answer_index,
        image: None,
    })
}

/// Resolves an answer letter to an option index (`A` -> 0 .. `D` -> 3).
fn resolve_answer_letter(answer: &str) -> Option<usize> {
    let mut chars = answer.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !('A'..='D').contains(&letter) {
        return None;
    }
    Some((letter as u8 - b'A') as usize)
}

fn encode_image(
    course_id: Uuid,
    row: u32,
    image: &drawings::AnchoredImage,
    blob: Option<&dyn BlobStore>,
    settings: &ImportSettings,
) -> Result<QuestionImage> {
    match blob {
        Some(blob) if !settings.inline_images => {
            let destination = format!(
                "courses/{course_id}/images/row{row}.{}",
                image.extension
            );
            Ok(QuestionImage::Url(blob.upload(&image.bytes, &destination)?))
        }
        _ => Ok(QuestionImage::DataUri(format!(
            "data:{};base64,{}",
            image.mime,
            BASE64.encode(&image.bytes)
        ))),
    }
}

/// Places the image marker after the first blank-line run, or at the end
/// when the text has none.
fn insert_image_placeholder(text: &str) -> String {
    if let Some(pos) = text.find("\n\n") {
        let bytes = text.as_bytes();
        let mut end = pos;
        while end < bytes.len() && bytes[end] == b'\n' {
            end += 1;
        }
        format!("{}{}\n{}", &text[..end], IMAGE_PLACEHOLDER, &text[end..])
    } else {
        format!("{text}\n{IMAGE_PLACEHOLDER}")
    }
}
