//! Common result and error types for the bake toolchain.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable internal error (a bug in bake), not a
/// failure of user code. Macro failures are reported as
/// `MacroError` values and never travel through this type.
pub type BakeResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in bake, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("index out of sync");
        assert_eq!(format!("{err}"), "internal error: index out of sync");
    }

    #[test]
    fn err_path() {
        let r: BakeResult<i32> = Err(InternalError::new("test error"));
        assert_eq!(r.err().unwrap().message, "test error");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }
}
