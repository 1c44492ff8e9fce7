use std::fmt;
use std::time::Duration;

/// Progress notifications emitted while a harvest runs. Advisory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    PlanReady {
        server_max: usize,
        page_size: usize,
        total_records: usize,
        chunk_count: usize,
        estimated_min: Duration,
    },
    ChunkStarted {
        ordinal: usize,
        records_through: usize,
        total_records: usize,
    },
    RetryScheduled {
        ordinal: usize,
        attempt: u32,
        delay: Duration,
        failure: AttemptFailure,
    },
    ChunkStaged {
        ordinal: usize,
        bytes: u64,
    },
    ChunkConverted {
        ordinal: usize,
        records: usize,
    },
    MergeCompleted {
        collection: String,
        records: usize,
    },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

/// Sink that drops every event; the log lines carry the same information.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: HarvestEvent) {}
}

/// Raw HTTP answer. Non-success statuses are returned, not raised, so the
/// caller can classify them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Response body of one chunk, as staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    pub ordinal: usize,
    pub bytes: Vec<u8>,
    /// Requests issued for this chunk, including the successful one.
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Why a single chunk request did not succeed. All variants are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    Transport(FetchError),
    HttpStatus(u16),
    /// Success status with a server error body, a sign of server overload.
    SoftServerError { status: u16 },
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Transport(err) => write!(f, "transport failure ({err})"),
            AttemptFailure::HttpStatus(code) => write!(f, "http status {code}"),
            AttemptFailure::SoftServerError { status } => {
                write!(f, "server error body despite status {status}")
            }
        }
    }
}
