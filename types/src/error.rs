//! Parse errors for the textual forms of the fundamental types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("unknown intent type: {0}")]
    UnknownIntentKind(String),

    #[error("unknown mint reason: {0}")]
    UnknownMintReason(String),
}
