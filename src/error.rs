use thiserror::Error;

use crate::types::IonType;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, IonHashError>;

/// Errors raised while hashing or navigating Ion values.
#[derive(Debug, Error)]
pub enum IonHashError {
    /// A method was called when the current state forbids it.
    #[error("ionhash: {type_name}.{method}: {message}")]
    InvalidOperation {
        type_name: &'static str,
        method: &'static str,
        message: String,
    },
    /// An argument given to a constructor or operation was not valid.
    #[error("ionhash: invalid value: \"{value}\" specified for argument: {argument}")]
    InvalidArgument {
        argument: &'static str,
        value: String,
    },
    /// A scalar accessor was called against a value of another type.
    #[error("ionhash: type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: IonType, found: String },
    /// Failure raised by the wrapped reader, passed through as-is.
    #[error(transparent)]
    Reader(#[from] anyhow::Error),
}

impl IonHashError {
    pub(crate) fn invalid_operation(
        type_name: &'static str,
        method: &'static str,
        message: impl Into<String>,
    ) -> Self {
        IonHashError::InvalidOperation {
            type_name,
            method,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(argument: &'static str, value: impl ToString) -> Self {
        IonHashError::InvalidArgument {
            argument,
            value: value.to_string(),
        }
    }
}
