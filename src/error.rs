use thiserror::Error;

/// Error taxonomy shared across the crate.
///
/// Callers embedding studybase behind an HTTP layer map these onto status
/// codes: `Validation`/`EmptyWorkbook` to 400, `NotFound` to 404, `Parse`
/// to 500 for unreadable uploads, `Store`/`Corrupt` to 500.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing required fields at an entry point. Nothing was
    /// persisted.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The uploaded workbook container could not be read at all.
    #[error("workbook could not be parsed: {0}")]
    Parse(String),

    /// The workbook parsed but no row survived validation.
    #[error("workbook contained no usable rows")]
    EmptyWorkbook,

    /// A referenced course, question, or user record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A filesystem-level store operation failed.
    #[error("store operation failed")]
    Store(#[from] std::io::Error),

    /// A stored document could not be decoded.
    #[error("stored document is corrupt")]
    Corrupt(#[from] serde_json::Error),

    /// The workspace configuration file could not be decoded.
    #[error("invalid configuration")]
    Config(#[from] toml::de::Error),

    /// The workspace configuration could not be serialized.
    #[error("configuration could not be written")]
    ConfigWrite(#[from] toml::ser::Error),

    /// The workspace root could not be resolved on this host.
    #[error("no workspace root available; set STUDYBASE_HOME")]
    NoWorkspace,
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
