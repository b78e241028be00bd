use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Column '{column}' does not exist on '{relation}'")]
    UnknownColumn { relation: String, column: String },

    #[error("No permitted columns to select from '{0}'")]
    NoColumns(String),

    #[error("No values to write to '{0}'")]
    NoValues(String),

    #[error("Invalid sort order: {0}")]
    InvalidSortOrder(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Invalid value for '{column}': {reason}")]
    InvalidValue { column: String, reason: String },
}
