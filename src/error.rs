use std::path::PathBuf;
use thiserror::Error;

/// Reasons a single exam workbook can be rejected by the loader.
///
/// A `LoadError` never aborts a directory scan; the offending file is skipped
/// and reported alongside the dataset in a [`crate::loader::LoadReport`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("workbook contains no worksheets")]
    NoWorksheet,

    #[error("worksheet has no header row")]
    MissingHeader,

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// A workbook the loader skipped, together with the reason.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: LoadError,
}

/// Rejection reasons for user-supplied student identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StudentIdError {
    #[error("Student ID is required!")]
    Empty,

    #[error("Invalid Student ID format. Must be a 9-digit number.")]
    InvalidFormat,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("invalid password hash format: {0}")]
    InvalidHash(String),

    #[error("username and password cannot be empty")]
    EmptyCredentials,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Errors surfaced by the web handlers; each one renders as HTTP 500.
#[cfg(feature = "web")]
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid template: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("template rendering failed: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

#[cfg(feature = "web")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        log::error!("request failed: {}", self);
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
        )
            .into_response()
    }
}
