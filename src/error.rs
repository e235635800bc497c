use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum OmicsError {
    #[error("invalid argument: {0}")]
    #[diagnostic(code(kira::validation))]
    Validation(String),

    #[error("remote fetch failed after {attempts} attempts")]
    #[diagnostic(code(kira::fetch))]
    Fetch {
        attempts: u32,
        #[source]
        source: Box<OmicsError>,
    },

    #[error("data integrity violation: {0}")]
    #[diagnostic(code(kira::integrity))]
    Integrity(String),

    #[error("cBioPortal request failed: {0}")]
    CgdsHttp(String),

    #[error("cBioPortal returned status {status}: {message}")]
    CgdsStatus { status: u16, message: String },

    #[error("malformed tabular payload: {0}")]
    Parse(String),

    #[error("Human Protein Atlas request failed: {0}")]
    HpaHttp(String),

    #[error("Human Protein Atlas returned status {status}: {message}")]
    HpaStatus { status: u16, message: String },

    #[error("cache error: {0}")]
    Cache(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("CSV error: {0}")]
    Csv(String),
}

impl OmicsError {
    /// Transport, status and payload failures are worth another attempt;
    /// anything else is a caller or data problem and surfaces immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OmicsError::CgdsHttp(_)
                | OmicsError::CgdsStatus { .. }
                | OmicsError::Parse(_)
                | OmicsError::HpaHttp(_)
                | OmicsError::HpaStatus { .. }
        )
    }
}

impl From<csv::Error> for OmicsError {
    fn from(err: csv::Error) -> Self {
        OmicsError::Csv(err.to_string())
    }
}
