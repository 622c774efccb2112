//! Stable error codes shared by every error type the engine surfaces.

use serde::Serialize;

/// Maps an error to a stable machine-readable code.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    /// Text shown to the user. Defaults to the `Display` output.
    fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Serializable `{ code, message }` pair handed to hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub code: &'static str,
    pub message: String,
}

impl ErrorReport {
    #[must_use]
    pub fn from_error(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { code: err.error_code(), message: err.user_message() }
    }
}
