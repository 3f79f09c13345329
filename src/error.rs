//! Error taxonomy for the engine

use thiserror::Error;

/// Broad classification used by callers to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request's input violates a condition the engine checks
    InvalidInput,
    /// The engine failed while producing output
    Internal,
}

/// Errors raised by the load / merge / clean / split pipeline
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unable to parse file {filename}: {reason}")]
    UnparseableSource { filename: String, reason: String },

    #[error("the uploaded files could not be parsed or contain no data")]
    EmptyInput,

    #[error("the selected files have no columns in common")]
    NoCommonColumns,

    #[error("split column '{column}' does not exist in the file")]
    UnknownGroupColumn { column: String },

    #[error("splitting by the given column produced no groups")]
    NoGroupsProduced,

    #[error("internal error while writing the workbook")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("internal error while packaging the archive")]
    Archive(#[from] zip::result::ZipError),

    #[error("internal I/O error")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn unparseable(filename: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::UnparseableSource {
            filename: filename.into(),
            reason: format!("{:#}", err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::UnparseableSource { .. }
            | EngineError::EmptyInput
            | EngineError::NoCommonColumns
            | EngineError::UnknownGroupColumn { .. }
            | EngineError::NoGroupsProduced => ErrorKind::InvalidInput,
            EngineError::Workbook(_) | EngineError::Archive(_) | EngineError::Io(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// True when the failure is the caller's input rather than the engine
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::InvalidInput
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
