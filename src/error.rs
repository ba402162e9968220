//! Library error types

use thiserror::Error;

use crate::version::Version;

/// Errors raised while reading or writing song files
///
/// A failed load never touches the live song or binding store.
#[derive(Debug, Error)]
pub enum SongError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a song file (bad magic)")]
    BadMagic,

    #[error("song version {found} is newer than supported {supported}")]
    UnsupportedVersion { found: Version, supported: Version },

    #[error("song file is truncated")]
    Truncated,

    #[error("string field is {len} bytes, limit is {limit}")]
    StringTooLong { len: usize, limit: usize },

    #[error("corrupt event block: {0}")]
    Corrupt(String),

    #[error("song holds {count} events, limit is {limit}")]
    TooManyEvents { count: usize, limit: usize },

    #[error("song is empty")]
    Empty,

    #[error("song is write protected")]
    WriteProtected,
}

pub type SongResult<T> = Result<T, SongError>;
