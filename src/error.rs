use thiserror::Error;

/// Failure to turn a single proxy URI into a [`crate::model::Node`].
///
/// Every variant is recoverable: batch import records the error against the
/// offending line and moves on to the next one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed uri: {0}")]
    MalformedUri(String),

    #[error("malformed address `{0}`: expected host:port")]
    MalformedAddress(String),

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("invalid base64 payload")]
    Base64Decode,

    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("invalid user info: {0}")]
    InvalidUserInfo(String),
}
