use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Network-level failure: connect, timeout, TLS. Callers fall back to a
    /// safe default instead of surfacing these to the user.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered but rejected the request (non-2xx or an envelope
    /// with `success: false`).
    #[error("backend rejected request: {0}")]
    Api(String),

    /// The backend answered 2xx with a body we could not interpret.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    /// The refresh-token exchange failed; the session has been cleared and
    /// the user must log in again.
    #[error("session expired; login required")]
    SessionExpired,

    #[error("no active session")]
    NoSession,

    #[error("storage error: {0}")]
    Storage(anyhow::Error),
}

impl From<anyhow::Error> for BackendError {
    fn from(err: anyhow::Error) -> Self {
        BackendError::Storage(err)
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;
