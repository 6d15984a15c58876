use thiserror::Error;

#[derive(Error, Debug)]
pub enum CountdownError {
    #[error("Compression error: {0}")]
    Compression(#[from] CompressionError),

    #[error("Invalid countdown: {0}")]
    Invalid(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompressionError {
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),
}

/// Errors surfaced to the user when importing a shared countdown.
///
/// The two variants map to different guidance: "this link is invalid" versus
/// "could not read this countdown".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterchangeError {
    #[error("Invalid share link: {0}")]
    InvalidLocator(String),

    #[error("Could not read shared countdown: {0}")]
    DecodeFailed(String),
}

impl From<CompressionError> for InterchangeError {
    fn from(e: CompressionError) -> Self {
        InterchangeError::DecodeFailed(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Image has no pixels")]
    Empty,
}
