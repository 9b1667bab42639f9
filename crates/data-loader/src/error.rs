//! Error types for the data-loader crate.
//!
//! Every variant names the file it came from so the caller can report
//! which input halted the pipeline.

use thiserror::Error;

/// Errors that can occur while loading the source tables
///
/// Row-level problems (missing or unparseable values) are not errors here:
/// they are counted at load time and resolved by the preprocessor's
/// missing-value policy. Only problems with a file as a whole surface as
/// a `DataLoadError`.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error in {file}: {source}")]
    IoError {
        file: String,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader failed on the file as a whole (e.g. unreadable header)
    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// File has no header or no data rows
    #[error("File {file} is empty")]
    EmptyFile { file: String },

    /// Header is missing one or more expected columns
    #[error("Schema mismatch in {file}: missing column(s) {}", missing.join(", "))]
    SchemaMismatch { file: String, missing: Vec<String> },
}

impl DataLoadError {
    /// Name of the file this error refers to
    pub fn file(&self) -> &str {
        match self {
            DataLoadError::FileNotFound { path } => path,
            DataLoadError::IoError { file, .. }
            | DataLoadError::Csv { file, .. }
            | DataLoadError::EmptyFile { file }
            | DataLoadError::SchemaMismatch { file, .. } => file,
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
