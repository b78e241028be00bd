use thiserror::Error;

#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    #[error("Unknown relation role: {0}")]
    UnknownRole(String),

    #[error("Unknown access level: {0}")]
    UnknownAccessLevel(String),

    #[error("Column '{column}' is not defined on relation '{relation}'")]
    UnknownColumn { relation: String, column: String },

    #[error("You do not have permission to {action} the following columns: {}", .columns.join(", "))]
    ForbiddenColumns {
        relation: String,
        action: &'static str,
        columns: Vec<String>,
    },

    #[error("Failed to load permission table: {0}")]
    Source(String),
}
