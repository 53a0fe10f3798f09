use std::io;
use thiserror::Error;

/// Errors raised while building, encoding, decoding or applying signatures
/// and deltas.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested block length cannot hold a strong hash.
    #[error("block length {length} is too small, min size = {min}")]
    BlockLength { length: u32, min: u32 },

    /// Failure of the underlying byte stream.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Malformed signature or delta payload.
    #[error("corrupted data: {0}")]
    Corrupt(String),
}

impl Error {
    pub(crate) fn corrupt<S: Into<String>>(msg: S) -> Self {
        Error::Corrupt(msg.into())
    }

    /// Tells whether this is a malformed-payload error.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
