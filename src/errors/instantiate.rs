use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error(transparent)]
    Field(#[from] FieldErrorKind),
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

/// Errors of reading resolved values while assembling a [`crate::Component`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    #[error("Field {index} has no resolved value")]
    Missing { index: usize },
    #[error("Field {index} was already taken")]
    Taken { index: usize },
    #[error("Field {index} has incorrect type. Expected: {expected}")]
    IncorrectType { index: usize, expected: TypeInfo },
    #[error("Field {index} is out of range, component has {len} fields")]
    OutOfRange { index: usize, len: usize },
}
