use thiserror::Error;
use uuid::Uuid;

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Canonical error codes surfaced to MCP tool callers (spec §6/§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationError,
    ResourceNotFound,
    ConflictError,
    DatabaseError,
    OperationFailed,
    InternalError,
    DuplicateResource,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::ConflictError => "CONFLICT_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::OperationFailed => "OPERATION_FAILED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::DuplicateResource => "DUPLICATE_RESOURCE",
        }
    }
}

/// Errors raised by the workflow engine and the repository contracts it
/// depends on. Each variant maps to a single canonical error code (§7).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    /// Entity referenced by id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Shape/enum/UUID/batch-bound validation failure, including illegal
    /// status strings and failed transition prerequisites.
    #[error("validation error: {0}")]
    Validation(String),

    /// A unique key already exists, or a protected entity was targeted by
    /// an incompatible mutation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Specialization of conflict kept distinct because the tool surface
    /// maps it to its own error code.
    #[error("duplicate resource: {0}")]
    Duplicate(String),

    /// Repository/storage failure.
    #[error("database error: {0}")]
    Database(String),

    /// An operation could not complete for a reason that isn't a validation
    /// or not-found problem, e.g. a batch item whose prerequisite state
    /// changed out from under it mid-batch.
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OrchestratorError {
    pub fn not_found(entity: &str, id: Uuid) -> Self {
        Self::NotFound(format!("{entity} {id} not found"))
    }

    pub fn empty_field(field: &str) -> Self {
        Self::Validation(format!("field '{field}' cannot be empty"))
    }

    pub fn invalid_status(status: &str, container: &str) -> Self {
        Self::Validation(format!("'{status}' is not a valid {container} status"))
    }

    pub fn invalid_transition(from: &str, to: &str) -> Self {
        Self::Validation(format!("cannot transition from '{from}' to '{to}'"))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            OrchestratorError::NotFound(_) => ErrorCode::ResourceNotFound,
            OrchestratorError::Validation(_) => ErrorCode::ValidationError,
            OrchestratorError::Conflict(_) => ErrorCode::ConflictError,
            OrchestratorError::Duplicate(_) => ErrorCode::DuplicateResource,
            OrchestratorError::Database(_) => ErrorCode::DatabaseError,
            OrchestratorError::OperationFailed(_) => ErrorCode::OperationFailed,
            OrchestratorError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, OrchestratorError::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, OrchestratorError::Validation(_))
    }

    pub fn is_database(&self) -> bool {
        matches!(self, OrchestratorError::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_one_to_one() {
        assert_eq!(
            OrchestratorError::NotFound("x".into()).code().as_str(),
            "RESOURCE_NOT_FOUND"
        );
        assert_eq!(
            OrchestratorError::Validation("x".into()).code().as_str(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            OrchestratorError::Duplicate("x".into()).code().as_str(),
            "DUPLICATE_RESOURCE"
        );
    }

    #[test]
    fn not_found_message_includes_entity_and_id() {
        let id = Uuid::nil();
        let err = OrchestratorError::not_found("task", id);
        assert!(err.to_string().contains("task"));
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn predicates_match_variant() {
        assert!(OrchestratorError::NotFound("x".into()).is_not_found());
        assert!(!OrchestratorError::Validation("x".into()).is_not_found());
        assert!(OrchestratorError::Validation("x".into()).is_validation());
        assert!(OrchestratorError::Database("x".into()).is_database());
    }
}
