use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackerErrorCode {
    InvalidArgument,
    ConfigResolution,
    Transport,
    Internal,
}

impl TrackerErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerErrorCode::InvalidArgument => "tracker/invalid-argument",
            TrackerErrorCode::ConfigResolution => "tracker/config-resolution",
            TrackerErrorCode::Transport => "tracker/transport",
            TrackerErrorCode::Internal => "tracker/internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct TrackerError {
    pub code: TrackerErrorCode,
    message: String,
}

impl TrackerError {
    pub fn new(code: TrackerErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_transport(&self) -> bool {
        self.code == TrackerErrorCode::Transport
    }
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for TrackerError {}

pub type TrackerResult<T> = Result<T, TrackerError>;

pub fn invalid_argument(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorCode::InvalidArgument, message)
}

pub fn config_resolution_failed(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorCode::ConfigResolution, message)
}

pub fn transport_error(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorCode::Transport, message)
}

pub fn internal_error(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorCode::Internal, message)
}
