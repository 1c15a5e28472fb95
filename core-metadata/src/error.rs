use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Metadata service rejected the request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Metadata service failed (HTTP {status}): {body}")]
    RemoteFailure { status: u16, body: String },

    #[error("Unexpected HTTP status from metadata service: {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Invalid metadata response: {0}")]
    InvalidResponse(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
