use std::path::PathBuf;
use thiserror::Error;

/// Failure category, used by callers to decide how an error is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The store could not be opened. Fatal for the session.
    IoFailure,
    InvalidDate,
    FutureDate,
    ReadFailure,
    WriteFailure,
    DecodeFailure,
    Closed,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("opening database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("could not resolve the user home directory")]
    NoHomeDir,
    #[error("invalid date key {0:?}, expected YYMMDD")]
    InvalidDate(String),
    #[error("requesting habits for {0:?}, a future date")]
    FutureDate(String),
    #[error("{context}: {source}")]
    Read {
        context: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("{context}: {source}")]
    Write {
        context: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("decoding {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("encoding {context}: {source}")]
    Encode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store is not open")]
    Closed,
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } | Self::Open { .. } | Self::NoHomeDir => ErrorKind::IoFailure,
            Self::InvalidDate(_) => ErrorKind::InvalidDate,
            Self::FutureDate(_) => ErrorKind::FutureDate,
            Self::Read { .. } => ErrorKind::ReadFailure,
            Self::Write { .. } | Self::Encode { .. } | Self::Task(_) => ErrorKind::WriteFailure,
            Self::Decode { .. } => ErrorKind::DecodeFailure,
            Self::Closed => ErrorKind::Closed,
        }
    }

    pub(crate) fn read(context: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> Self {
        let context = context.into();
        move |source| Self::Read { context, source }
    }

    pub(crate) fn write(context: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> Self {
        let context = context.into();
        move |source| Self::Write { context, source }
    }

    pub(crate) fn decode(context: impl Into<String>) -> impl FnOnce(serde_json::Error) -> Self {
        let context = context.into();
        move |source| Self::Decode { context, source }
    }

    pub(crate) fn encode(context: impl Into<String>) -> impl FnOnce(serde_json::Error) -> Self {
        let context = context.into();
        move |source| Self::Encode { context, source }
    }
}
