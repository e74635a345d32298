use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key file {path} has {len} bytes, expected 32")]
    SeedLength { path: String, len: usize },
}
