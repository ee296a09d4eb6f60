//! The error taxonomy of §7. Every public Room Manager operation returns
//! `Result<T, ServerError>`; the dispatcher turns an `Err` into an `error` frame sent
//! only to the originating client, never broadcast, and never unwinds across the
//! WebSocket boundary.

use serde::Serialize;

/// The eight error kinds named in §7, plus `Internal` for invariant breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Protocol,
    Validation,
    Authorization,
    State,
    NotFound,
    Exhausted,
    Resource,
    Transient,
    Internal,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ServerError {
    pub kind: ErrorKind,
    /// The wire `code`, e.g. `ROOM_NOT_FOUND` or a mode-prefixed analog `MC_JOIN_FAILED`.
    pub code: String,
    pub message: String,
}

impl ServerError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerError {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, "INVALID_JSON", message)
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, "INVALID_FORMAT", message)
    }

    pub fn unknown_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, "UNKNOWN_TYPE", message)
    }

    pub fn room_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, "ROOM_NOT_FOUND", message)
    }

    pub fn room_gone(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, "ROOM_GONE", message)
    }

    pub fn join_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::State, "JOIN_FAILED", message)
    }

    pub fn reconnect_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, "RECONNECT_FAILED", message)
    }

    pub fn start_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::State, "START_FAILED", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, "INTERNAL_ERROR", message)
    }

    pub fn authorization(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, code, message)
    }

    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, code, message)
    }

    pub fn state(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::State, code, message)
    }

    pub fn exhausted(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Exhausted, code, message)
    }

    pub fn resource(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resource, code, message)
    }

    pub fn transient(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, code, message)
    }

    /// Renders the wire `error` frame (§6).
    pub fn to_frame(&self) -> ErrorFrame<'_> {
        ErrorFrame {
            r#type: "error",
            message: &self.message,
            code: Some(&self.code),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorFrame<'a> {
    pub r#type: &'static str,
    pub message: &'a str,
    pub code: Option<&'a str>,
}
