use super::response::ResponseType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScpError {
    /// I/O failure on the underlying stream.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error(transparent)]
    DirectiveParse(#[from] DirectiveParseError),

    /// The remote answered with a warning or an error status.
    #[error("remote {kind:?}: {}", .message.trim_end())]
    RemoteFailure { kind: ResponseType, message: String },

    #[error("transfer cancelled")]
    Cancelled,

    #[error("transfer deadline exceeded")]
    DeadlineExceeded,

    /// A previous error left the session unusable.
    #[error("session already terminated")]
    SessionTerminated,

    #[error("local file {path}: {source}")]
    LocalFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ScpError {
    /// Whether the error leaves the session unusable, as opposed to failing only
    /// the file currently being transferred.
    pub fn is_session_fatal(&self) -> bool {
        match self {
            ScpError::DirectiveParse(_) | ScpError::LocalFile { .. } => false,
            ScpError::RemoteFailure { kind, .. } => *kind == ResponseType::Error,
            _ => true,
        }
    }

    pub fn is_remote_failure(&self) -> bool {
        matches!(self, ScpError::RemoteFailure { .. })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectiveParseError {
    #[error("unable to parse permission directive")]
    Permission,
    #[error("unable to parse time directive")]
    Time,
    #[error("unable to parse access time component of time directive")]
    AccessTime,
    #[error("unable to parse modify time component of time directive")]
    ModifyTime,
}
