//! Runtime error types.

use std::io;

use thiserror::Error;

use replay_kernel::codec::CodecError;

/// Everything that can go wrong opening, writing or finalizing a session log.
#[derive(Error, Debug)]
pub enum RecorderError {
    /// A log could not be opened for reading.
    #[error("cannot open playback file {0}")]
    OpenForLoading(String),

    /// A log could not be opened for writing.
    #[error("cannot open record file {0}")]
    OpenForSaving(String),

    /// The playback log does not carry the record signature.
    #[error("unknown record file signature {found:#010x} in {file}")]
    BadSignature { file: String, found: u32 },

    /// Stream failure while reading or writing a log.
    #[error("I/O error on {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RecorderError {
    /// Attach a file name to a codec failure.
    pub fn from_codec(file: &str, err: CodecError) -> Self {
        match err {
            CodecError::BadSignature { found } => RecorderError::BadSignature {
                file: file.to_string(),
                found,
            },
            CodecError::Io(source) => RecorderError::Io {
                file: file.to_string(),
                source,
            },
        }
    }

    pub fn io(file: &str, source: io::Error) -> Self {
        RecorderError::Io {
            file: file.to_string(),
            source,
        }
    }
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RecorderError>;
