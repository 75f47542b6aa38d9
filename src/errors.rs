use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LlinatgeError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(llinatge::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(llinatge::config))]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(llinatge::serde))]
    Serde(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    #[diagnostic(code(llinatge::db))]
    Db(#[from] sea_orm::DbErr),

    #[error("Not found: {0}")]
    #[diagnostic(code(llinatge::not_found))]
    NotFound(String),

    #[error("Bad request: {0}")]
    #[diagnostic(code(llinatge::bad_request))]
    BadRequest(String),

    #[error("Change without data: {0}")]
    #[diagnostic(code(llinatge::change_without_data))]
    ChangeWithoutData(String),

    #[error("{0}")]
    #[diagnostic(code(llinatge::other))]
    Other(String),
}
