use crate::ir::stmt::StmtId;
use crate::ir::types::TypeError;

/// Failure to generate one offload. Every variant names the statement
/// that triggered it; no partial shader text survives an error.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CodegenError {
    #[error("{stmt}: {source}")]
    UnsupportedType {
        stmt: StmtId,
        #[source]
        source: TypeError,
    },
    #[error("{stmt}: {message}")]
    TypeMismatch { stmt: StmtId, message: String },
    #[error("{stmt}: `{resource}` is read-only in a {stage} stage")]
    ReadOnlyResource {
        stmt: StmtId,
        resource: String,
        stage: &'static str,
    },
    #[error("{stmt}: {message}")]
    UndeclaredResource { stmt: StmtId, message: String },
    #[error("{stmt}: `{kind}` cannot be generated in a {stage} stage")]
    NoHandler {
        stmt: StmtId,
        kind: &'static str,
        stage: &'static str,
    },
    #[error("{stmt}: global temporary offset {offset} is not 4-byte aligned")]
    MisalignedTemporary { stmt: StmtId, offset: u32 },
    #[error("{stmt}: field {field} does not fit i32 word addressing")]
    FieldOutOfRange { stmt: StmtId, field: u32 },
    #[error("{stmt} reads {operand}, which is computed by another offload")]
    CrossOffloadReference { stmt: StmtId, operand: StmtId },
}

impl CodegenError {
    /// Statement the error is attached to.
    pub fn stmt(&self) -> StmtId {
        match self {
            CodegenError::UnsupportedType { stmt, .. }
            | CodegenError::TypeMismatch { stmt, .. }
            | CodegenError::ReadOnlyResource { stmt, .. }
            | CodegenError::UndeclaredResource { stmt, .. }
            | CodegenError::NoHandler { stmt, .. }
            | CodegenError::MisalignedTemporary { stmt, .. }
            | CodegenError::FieldOutOfRange { stmt, .. }
            | CodegenError::CrossOffloadReference { stmt, .. } => *stmt,
        }
    }

    pub(crate) fn unsupported(stmt: StmtId, source: TypeError) -> Self {
        CodegenError::UnsupportedType { stmt, source }
    }

    pub(crate) fn mismatch(stmt: StmtId, message: impl Into<String>) -> Self {
        CodegenError::TypeMismatch {
            stmt,
            message: message.into(),
        }
    }
}
