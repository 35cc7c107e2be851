//! Error types for the docdash library.
//!
//! Three error types match the three places a submission can stop:
//!
//! * [`ValidationError`]: the staged input does not satisfy the active
//!   tool's preconditions. Raised before any network activity; always
//!   user-correctable.
//!
//! * [`DispatchError`]: a request was refused pre-flight (service offline,
//!   options for the wrong tool) or the request/response cycle failed
//!   (HTTP status, transport, decode).
//!
//! * [`DocdashError`]: everything a [`crate::session::Session`] can report
//!   to its consumer: a wrapper over the two above plus session-level
//!   misuse (no tool selected, unknown tool) and local I/O.
//!
//! None of these are fatal to the process. The consumer shows the message and
//! the user may retry or pick another tool.

use crate::registry::ToolId;
use std::path::PathBuf;
use thiserror::Error;

/// Why staged input was rejected for the active tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A file-mode tool has nothing staged.
    #[error("Please select a file to upload.")]
    NoFile,

    /// The multi-file tool needs at least `required` files.
    #[error("Please select at least {required} files (got {got}).")]
    TooFewFiles { required: usize, got: usize },

    /// A staged file exceeds the tool's size ceiling.
    #[error("'{name}' is too large: {size} bytes (limit {limit} bytes).")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    /// A staged file does not match any accepted extension or MIME pattern.
    #[error("'{name}' is not a supported file type. Accepted: {accepted}.")]
    UnsupportedType { name: String, accepted: String },

    /// Trimmed text is shorter than the tool's minimum.
    #[error(
        "Text too short: {needed} more character{} needed (minimum {min}).",
        plural(.needed)
    )]
    TextTooShort { min: usize, needed: usize },

    /// Trimmed text is longer than the tool's maximum.
    #[error("Text too long: {len} characters (maximum {max}).")]
    TextTooLong { max: usize, len: usize },

    /// The staged input is of the wrong kind for the tool (text for a file
    /// tool, or the reverse).
    #[error("{tool} expects {expected}.")]
    WrongInputKind { tool: ToolId, expected: &'static str },
}

fn plural(n: &usize) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}

/// Why a dispatch produced no result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// The tool's service was not `online` at submit time; nothing was sent.
    #[error("The {tool} service is offline.\nStart the backend service and wait for the next health check.")]
    ServiceOffline { tool: ToolId },

    /// The supplied options belong to a different tool.
    #[error("Options for '{got}' cannot be sent to {tool} (expects '{expected}').")]
    OptionsMismatch {
        tool: ToolId,
        expected: &'static str,
        got: &'static str,
    },

    /// The input shape does not fit the tool's request body.
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    /// Non-2xx status. `message` is the service's `error` field when the body
    /// was JSON, otherwise synthesised from the status line.
    #[error("{tool} failed (HTTP {status}): {message}")]
    Http {
        tool: ToolId,
        status: u16,
        message: String,
    },

    /// Connection refused, reset, body read failure and the like.
    #[error("Network error talking to {tool}: {detail}\nCheck that the service is running.")]
    Transport { tool: ToolId, detail: String },

    /// The response was 2xx but its body could not be decoded into the
    /// expected shape.
    #[error("Unexpected response from {tool}: {detail}")]
    Decode { tool: ToolId, detail: String },
}

impl DispatchError {
    /// True when the failure happened before any request was sent.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            DispatchError::ServiceOffline { .. }
                | DispatchError::OptionsMismatch { .. }
                | DispatchError::InvalidInput(_)
        )
    }
}

/// Errors surfaced by the session and the file helpers.
#[derive(Debug, Error)]
pub enum DocdashError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// `submit` was called before any tool was selected.
    #[error("No tool selected.")]
    NoToolSelected,

    /// The tool id is not in the registry.
    #[error("Unknown tool '{0}'.\nRun `docdash tools` to list the available tools.")]
    UnknownTool(String),

    /// Tool selection refused because its service is not online.
    #[error("{tool} is unavailable (service status: {status}).")]
    ToolUnavailable { tool: ToolId, status: String },

    /// A file index passed to a reorder/remove call is out of bounds.
    #[error("File index {index} is out of range ({len} files staged).")]
    FileIndexOutOfRange { index: usize, len: usize },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Could not create or write an artifact file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_too_short_singular() {
        let e = ValidationError::TextTooShort { min: 50, needed: 1 };
        let msg = e.to_string();
        assert!(msg.contains("1 more character needed"), "got: {msg}");
        assert!(msg.contains("minimum 50"), "got: {msg}");
    }

    #[test]
    fn text_too_short_plural() {
        let e = ValidationError::TextTooShort { min: 50, needed: 7 };
        assert!(e.to_string().contains("7 more characters needed"));
    }

    #[test]
    fn offline_display_names_tool() {
        let e = DispatchError::ServiceOffline {
            tool: ToolId::PdfMerge,
        };
        let msg = e.to_string();
        assert!(msg.contains("pdf-merge"), "got: {msg}");
        assert!(msg.contains("offline"), "got: {msg}");
        assert!(e.is_preflight());
    }

    #[test]
    fn http_display() {
        let e = DispatchError::Http {
            tool: ToolId::TextSummary,
            status: 400,
            message: "Text too short".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("HTTP 400"));
        assert!(msg.contains("Text too short"));
        assert!(!e.is_preflight());
    }

    #[test]
    fn validation_converts_into_session_error() {
        let e: DocdashError = ValidationError::NoFile.into();
        assert_eq!(e.to_string(), "Please select a file to upload.");
    }
}
