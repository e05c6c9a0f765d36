use thiserror::Error;

/// Failures of the Remote Archive Service. Components log these and turn
/// them into state; they never reach the user as raw errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("remote archive not configured: {0}")]
    NotConfigured(String),
    #[error("remote request for {operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("remote service rejected {operation} with status {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("remote response for {operation} could not be decoded: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },
}

impl ArchiveError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "not-configured",
            Self::Transport { .. } => "remote-transport",
            Self::Rejected { .. } => "remote-rejected",
            Self::Decode { .. } => "remote-decode",
        }
    }
}
