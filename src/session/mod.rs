//! Learning-mode session engine.
//!
//! The engine owns the ephemeral session state and is a plain transition
//! function over it: hosts feed it `SessionCommand`s and, for exam
//! sessions, call `tick()` once per second from whatever timer they own.
//! Nothing here spawns threads or timers, and nothing survives the value
//! being dropped — durable effects go through the injected stores.
//!
//! Store writes happen before any local mutation, so a failed write leaves
//! the session exactly where it was and the same command can be retried.

use crate::activity::{ActivityLog, EventType};
use crate::courses::{AnswerStatus, Question, QuestionPatch, SessionSettings};
use crate::error::{Error, Result};
use crate::stats::policy;
use crate::store::{QuestionStore, StatsStore};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

/// The three learning modes a session can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningMode {
    /// Full pool in original order, feedback after every answer.
    Practice,
    /// Timed random sample, feedback deferred to the summary.
    Exam,
    /// Incorrectly answered or saved questions only.
    Repeat,
}

impl LearningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningMode::Practice => "practice",
            LearningMode::Exam => "exam",
            LearningMode::Repeat => "repeat",
        }
    }
}

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// The derived working set was empty; no question was ever shown.
    Empty,
    Active,
    /// Exam only: results are on display, awaiting acknowledgment.
    Summary,
    Completed,
}

/// Host-driven inputs to the engine.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// The option string the user selected.
    Answer { answer: String },
    /// Advance past the currently displayed feedback.
    Next,
    /// Leave the exam summary screen.
    AcknowledgeSummary,
    /// Flip the saved-for-review flag on the current question.
    ToggleSaved,
}

/// Outcome of the most recent answer, shown until `Next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_option: String,
}

/// Exam results exposed while in `Summary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamSummary {
    pub correct: usize,
    pub total: usize,
}

pub struct SessionEngine<'a> {
    questions: &'a dyn QuestionStore,
    stats: &'a dyn StatsStore,
    log: &'a ActivityLog,
    course_id: Uuid,
    user_id: String,
    mode: LearningMode,
    session_id: Uuid,
    working_set: Vec<Question>,
    cursor: usize,
    phase: SessionPhase,
    feedback: Option<AnswerFeedback>,
    time_remaining: Option<u64>,
    correct_count: usize,
    /// Points earned in this session; the badge policy is evaluated
    /// against this running total, not the persisted one.
    session_points: u64,
}

impl<'a> SessionEngine<'a> {
    /// Starts a session with the thread-local RNG for exam sampling.
    pub fn start(
        questions: &'a dyn QuestionStore,
        stats: &'a dyn StatsStore,
        log: &'a ActivityLog,
        course_id: Uuid,
        user_id: &str,
        mode: LearningMode,
        settings: &SessionSettings,
    ) -> Result<Self> {
        Self::start_with_rng(
            questions,
            stats,
            log,
            course_id,
            user_id,
            mode,
            settings,
            &mut rand::thread_rng(),
        )
    }

    /// Starts a session with a caller-supplied RNG (deterministic tests).
    #[allow(clippy::too_many_arguments)]
    pub fn start_with_rng<R: Rng + ?Sized>(
        questions: &'a dyn QuestionStore,
        stats: &'a dyn StatsStore,
        log: &'a ActivityLog,
        course_id: Uuid,
        user_id: &str,
        mode: LearningMode,
        settings: &SessionSettings,
        rng: &mut R,
    ) -> Result<Self> {
        let pool = questions.questions(course_id)?;
        let working_set = derive_working_set(pool, mode, settings, rng);
        let time_remaining = match mode {
            LearningMode::Exam => Some(settings.exam_duration_secs),
            _ => None,
        };
        let mut engine = Self {
            questions,
            stats,
            log,
            course_id,
            user_id: user_id.to_string(),
            mode,
            session_id: Uuid::new_v4(),
            working_set,
            cursor: 0,
            phase: SessionPhase::Active,
            feedback: None,
            time_remaining,
            correct_count: 0,
            session_points: 0,
        };
        engine.log.append(
            course_id,
            EventType::SessionStarted,
            json!({
                "session_id": engine.session_id,
                "mode": mode.as_str(),
                "working_set": engine.working_set.len()
            }),
        )?;
        if engine.working_set.is_empty() {
            match mode {
                // An empty repeat set means everything is done: the session
                // completes on the spot and still pays the traversal bonus.
                LearningMode::Repeat => engine.complete()?,
                _ => engine.phase = SessionPhase::Empty,
            }
        }
        Ok(engine)
    }

    pub fn apply(&mut self, command: SessionCommand) -> Result<()> {
        match command {
            SessionCommand::Answer { answer } => self.handle_answer(&answer),
            SessionCommand::Next => self.handle_next(),
            SessionCommand::AcknowledgeSummary => self.handle_acknowledge(),
            SessionCommand::ToggleSaved => self.handle_toggle_saved(),
        }
    }

    /// Advances the exam countdown by one second. No-op outside an active
    /// exam. Reaching zero discards any in-flight answer and moves straight
    /// to the summary without the traversal bonus.
    pub fn tick(&mut self) -> Result<()> {
        if self.mode != LearningMode::Exam || self.phase != SessionPhase::Active {
            return Ok(());
        }
        let remaining = self.time_remaining.get_or_insert(0);
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.feedback = None;
            self.phase = SessionPhase::Summary;
            self.log.append(
                self.course_id,
                EventType::ExamTimerExpired,
                json!({
                    "session_id": self.session_id,
                    "answered": self.cursor,
                    "correct": self.correct_count
                }),
            )?;
        }
        Ok(())
    }

    fn handle_answer(&mut self, answer: &str) -> Result<()> {
        if self.phase != SessionPhase::Active {
            return Err(Error::Validation("no active question to answer".into()));
        }
        if self.feedback.is_some() {
            return Err(Error::Validation(
                "feedback is pending; advance to the next question first".into(),
            ));
        }
        let question = self.working_set[self.cursor].clone();
        let correct_option = question
            .correct_option()
            .ok_or_else(|| {
                Error::Validation(format!(
                    "question {} has an out-of-bounds answer index",
                    question.question_id
                ))
            })?
            .to_string();
        let correct = answer == correct_option;

        self.questions.update_question(
            self.course_id,
            question.question_id,
            QuestionPatch::status(correct),
        )?;
        if correct {
            self.stats.add_points(
                &self.user_id,
                self.course_id,
                policy::POINTS_PER_CORRECT_ANSWER,
            )?;
        }
        self.log.append(
            self.course_id,
            EventType::AnswerEvaluated,
            json!({
                "session_id": self.session_id,
                "question_id": question.question_id,
                "mode": self.mode.as_str(),
                "correct": correct
            }),
        )?;

        self.working_set[self.cursor].last_status = Some(if correct {
            AnswerStatus::Correct
        } else {
            AnswerStatus::Incorrect
        });
        if correct {
            self.session_points += policy::POINTS_PER_CORRECT_ANSWER;
            self.award_badges()?;
        }

        match self.mode {
            LearningMode::Practice | LearningMode::Repeat => {
                self.feedback = Some(AnswerFeedback {
                    correct,
                    correct_option,
                });
            }
            LearningMode::Exam => {
                if correct {
                    self.correct_count += 1;
                }
                self.cursor += 1;
                if self.cursor == self.working_set.len() {
                    // Full traversal: the summary opens with the bonus paid.
                    self.award_completion_bonus()?;
                    self.phase = SessionPhase::Summary;
                }
            }
        }
        Ok(())
    }

    fn handle_next(&mut self) -> Result<()> {
        if self.phase != SessionPhase::Active {
            return Err(Error::Validation("session is not active".into()));
        }
        if self.feedback.is_none() {
            return Err(Error::Validation(
                "answer the current question before advancing".into(),
            ));
        }
        self.feedback = None;
        self.cursor += 1;
        if self.cursor == self.working_set.len() {
            self.complete()?;
        }
        Ok(())
    }

    fn handle_acknowledge(&mut self) -> Result<()> {
        if self.phase != SessionPhase::Summary {
            return Err(Error::Validation("no summary on display".into()));
        }
        self.phase = SessionPhase::Completed;
        self.log_completed()
    }

    fn handle_toggle_saved(&mut self) -> Result<()> {
        if self.phase != SessionPhase::Active {
            return Err(Error::Validation("session is not active".into()));
        }
        let question = &self.working_set[self.cursor];
        let updated = self.questions.update_question(
            self.course_id,
            question.question_id,
            QuestionPatch::saved(!question.is_saved),
        )?;
        self.working_set[self.cursor].is_saved = updated.is_saved;
        Ok(())
    }

    fn complete(&mut self) -> Result<()> {
        self.award_completion_bonus()?;
        self.phase = SessionPhase::Completed;
        self.log_completed()
    }

    fn award_completion_bonus(&mut self) -> Result<()> {
        let bonus = policy::completion_bonus(self.mode);
        self.stats.add_points(&self.user_id, self.course_id, bonus)?;
        self.session_points += bonus;
        self.award_badges()
    }

    fn award_badges(&mut self) -> Result<()> {
        for badge in policy::badges_for_points(self.session_points) {
            if self.stats.add_badge(&self.user_id, self.course_id, badge)? {
                self.log.append(
                    self.course_id,
                    EventType::BadgeAwarded,
                    json!({ "session_id": self.session_id, "badge": badge }),
                )?;
            }
        }
        Ok(())
    }

    fn log_completed(&self) -> Result<()> {
        self.log
            .append(
                self.course_id,
                EventType::SessionCompleted,
                json!({
                    "session_id": self.session_id,
                    "mode": self.mode.as_str(),
                    "session_points": self.session_points
                }),
            )
            .map(|_| ())
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn mode(&self) -> LearningMode {
        self.mode
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn working_set(&self) -> &[Question] {
        &self.working_set
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            SessionPhase::Active => self.working_set.get(self.cursor),
            _ => None,
        }
    }

    pub fn feedback(&self) -> Option<&AnswerFeedback> {
        self.feedback.as_ref()
    }

    pub fn time_remaining(&self) -> Option<u64> {
        self.time_remaining
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn session_points(&self) -> u64 {
        self.session_points
    }

    pub fn exam_summary(&self) -> Option<ExamSummary> {
        if self.mode == LearningMode::Exam
            && matches!(self.phase, SessionPhase::Summary | SessionPhase::Completed)
        {
            Some(ExamSummary {
                correct: self.correct_count,
                total: self.working_set.len(),
            })
        } else {
            None
        }
    }
}

fn derive_working_set<R: Rng + ?Sized>(
    pool: Vec<Question>,
    mode: LearningMode,
    settings: &SessionSettings,
    rng: &mut R,
) -> Vec<Question> {
    match mode {
        LearningMode::Practice => pool,
        LearningMode::Exam => {
            let count = (settings.exam_question_count as usize).min(pool.len());
            pool.choose_multiple(rng, count).cloned().collect()
        }
        LearningMode::Repeat => {
            let mut seen = HashSet::new();
            pool.into_iter()
                .filter(|q| q.last_status == Some(AnswerStatus::Incorrect) || q.is_saved)
                .filter(|q| seen.insert(q.question_id))
                .collect()
        }
    }
}

/// Formats a countdown as `m:ss` for display.
pub fn format_time_remaining(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
