use axum::http::StatusCode;

/// Longest key name a node will store.
pub const MAX_KEY_LEN: usize = 50;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    #[error("Key is too long")]
    KeyTooLong { len: usize },
    #[error("Value is missing")]
    MissingValue,
    #[error("Key does not exist")]
    NotFound,
    #[error("invalid view: {0}")]
    InvalidView(String),
    #[error("Key is not served by this node")]
    Misdirected,
    #[error("{sender} is not a replica peer under the current view")]
    StalePeer { sender: String },
    #[error("Node {address} is down")]
    PeerUnreachable { address: String },
    #[error("Node {address} rejected the request with status {status}")]
    PeerRejected { address: String, status: u16 },
}

impl KvError {
    /// Status code used when the error is surfaced through the key-value API.
    ///
    /// `KeyTooLong` keeps the historical `201` of the client contract.
    pub fn status(&self) -> StatusCode {
        match self {
            KvError::KeyTooLong { .. } => StatusCode::CREATED,
            KvError::MissingValue | KvError::InvalidView(_) => StatusCode::BAD_REQUEST,
            KvError::NotFound => StatusCode::NOT_FOUND,
            KvError::Misdirected => StatusCode::MISDIRECTED_REQUEST,
            KvError::StalePeer { .. } => StatusCode::CONFLICT,
            KvError::PeerUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            KvError::PeerRejected { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

pub type KvResult<T> = Result<T, KvError>;

pub fn validate_key(key: &str) -> KvResult<()> {
    let len = key.chars().count();
    if len > MAX_KEY_LEN {
        return Err(KvError::KeyTooLong { len });
    }
    Ok(())
}
