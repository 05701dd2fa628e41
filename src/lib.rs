pub mod activity;
pub mod courses;
pub mod error;
pub mod import;
pub mod session;
pub mod stats;
pub mod store;

// Re-export commonly used types for convenience.
pub use activity::{ActivityEvent, ActivityLog, EventType};
pub use courses::{AppConfig, Course, CourseManager, Question};
pub use error::{Error, Result};
pub use import::{import_workbook, ImportOutcome, ImportSummary};
pub use session::{LearningMode, SessionCommand, SessionEngine, SessionPhase};
pub use store::{BlobStore, QuestionStore, StatsStore};
