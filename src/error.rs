// Error types shared by every parser in the crate.
//
// Every decode operation returns a Result rather than panicking; the caller
// decides whether a failure aborts the whole demux or just the current page.

use thiserror::Error;

/// Result type alias for demux operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Magic / ID / version mismatch: the stream is not of the expected type
    /// or is corrupt at a structural boundary. Not retryable.
    #[error("format error: {0}")]
    Format(String),

    /// A declared length ran past the end of the data, or end-of-stream was
    /// reached with a partial packet still pending. A caller that fed us a
    /// partial file may treat this as "need more data".
    #[error("truncated stream: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// Granule position smaller than the declared pre-skip. The position
    /// arithmetic must not wrap; a stream that trips this is malformed.
    #[error("granule position {granule} is less than pre-skip {pre_skip}")]
    GranuleUnderflow { granule: u64, pre_skip: u16 },

    /// Cursor read past the end of the buffer. Always a bug or corruption.
    #[error("read out of bounds: needed {needed} bytes, {available} available")]
    Bounds { needed: usize, available: usize },

    /// IO error (file reading in the CLI)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }
}
