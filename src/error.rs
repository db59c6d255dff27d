// ─── Error ──────────────────────────────────────────────────────────────────
use smol_str::SmolStr;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse error category, for hosts that map failures onto their own types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Argument,
    SchemaMismatch,
    TypeMismatch,
    Builder,
    Codec,
    Config,
}

#[derive(Debug, Error)]
pub enum EngineError {
    // ── argument validation ────────────────────────────────────────────────
    #[error("{function}: expected {expected} arguments, got {actual}")]
    ArityMismatch {
        function: &'static str,
        expected: &'static str,
        actual: usize,
    },
    #[error("root schema must be a record, found {found}")]
    RootNotRecord { found: SmolStr },
    #[error("argument {position} must be a string-typed key")]
    NotAStringKey { position: usize },
    #[error("argument {position} must be a primitive value, found a record")]
    NotALeafValue { position: usize },
    #[error("key argument is null or not a string")]
    InvalidKey,
    #[error("path is empty")]
    EmptyPath,
    #[error("path `{path}` contains an empty segment")]
    EmptySegment { path: SmolStr },
    #[error("path has {depth} segments, the limit is {max}")]
    PathTooDeep { depth: usize, max: usize },
    #[error("assignment `{ancestor}` overlaps with `{descendant}`")]
    OverlappingAssignments { ancestor: SmolStr, descendant: SmolStr },
    #[error("invalid type string `{input}`: {reason}")]
    InvalidTypeString { input: SmolStr, reason: SmolStr },

    // ── schema / value shape ───────────────────────────────────────────────
    #[error("`{path}` expected a nested record, found {found}")]
    SchemaMismatch { path: SmolStr, found: SmolStr },
    #[error("value at `{path}` does not match its schema: {reason}")]
    ValueShapeMismatch { path: SmolStr, reason: SmolStr },
    #[error("type mismatch at `{path}`: expected {expected}, found {found}")]
    TypeMismatch {
        path: SmolStr,
        expected: SmolStr,
        found: SmolStr,
    },

    // ── builder contract ───────────────────────────────────────────────────
    #[error("ordinal {ordinal} out of range for record of {len} fields")]
    OrdinalOutOfRange { ordinal: usize, len: usize },
    #[error("ordinal {ordinal} was already set")]
    OrdinalAlreadySet { ordinal: usize },

    // ── codec ──────────────────────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot decode JSON at `{path}`: {reason}")]
    JsonDecode { path: SmolStr, reason: SmolStr },

    // ── config ─────────────────────────────────────────────────────────────
    #[error("invalid config: {reason}")]
    Config { reason: SmolStr },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::ArityMismatch { .. }
            | EngineError::RootNotRecord { .. }
            | EngineError::NotAStringKey { .. }
            | EngineError::NotALeafValue { .. }
            | EngineError::InvalidKey
            | EngineError::EmptyPath
            | EngineError::EmptySegment { .. }
            | EngineError::PathTooDeep { .. }
            | EngineError::OverlappingAssignments { .. }
            | EngineError::InvalidTypeString { .. } => ErrorKind::Argument,
            EngineError::SchemaMismatch { .. } | EngineError::ValueShapeMismatch { .. } => {
                ErrorKind::SchemaMismatch
            }
            EngineError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            EngineError::OrdinalOutOfRange { .. } | EngineError::OrdinalAlreadySet { .. } => {
                ErrorKind::Builder
            }
            EngineError::Json(_) | EngineError::JsonDecode { .. } => ErrorKind::Codec,
            EngineError::Config { .. } | EngineError::Io(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn type_mismatch(
        path: impl Into<SmolStr>,
        expected: impl Into<SmolStr>,
        found: impl Into<SmolStr>,
    ) -> Self {
        EngineError::TypeMismatch {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn shape(path: impl Into<SmolStr>, reason: impl Into<SmolStr>) -> Self {
        EngineError::ValueShapeMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(EngineError::EmptyPath.kind(), ErrorKind::Argument);
        assert_eq!(
            EngineError::type_mismatch("a", "leaf", "record").kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            EngineError::SchemaMismatch {
                path: "a.b".into(),
                found: "string".into()
            }
            .kind(),
            ErrorKind::SchemaMismatch
        );
        assert_eq!(
            EngineError::OrdinalAlreadySet { ordinal: 1 }.kind(),
            ErrorKind::Builder
        );
    }

    #[test]
    fn test_messages() {
        let err = EngineError::PathTooDeep { depth: 40, max: 32 };
        assert_eq!(err.to_string(), "path has 40 segments, the limit is 32");
        let err = EngineError::type_mismatch("address", "leaf", "record");
        assert_eq!(
            err.to_string(),
            "type mismatch at `address`: expected leaf, found record"
        );
    }
}
