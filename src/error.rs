use std::io;

use thiserror::Error;

/// Errors produced by the dispatcher, the binary codec and the bundled sinks.
#[derive(Debug, Error)]
pub enum Error {
    /// A logging call was made after the dispatcher was disposed.
    #[error("dispatcher has been disposed")]
    DispatcherDisposed,

    /// A sink was asked to process a record after it was disposed.
    #[error("sink has been disposed")]
    SinkDisposed,

    /// The binary stream contains a record version this build cannot read.
    /// The stream is unreadable past this point.
    #[error("unknown binary record version {0}")]
    UnknownRecordVersion(u8),

    #[error("invalid severity ordinal {0}")]
    InvalidSeverity(u8),

    #[error("unknown severity name {0:?}")]
    UnknownSeverityName(String),

    #[error("malformed binary record: {0}")]
    MalformedRecord(String),

    #[error("hex dump range {offset}+{length} exceeds {available} bytes")]
    HexDumpRange {
        offset: usize,
        length: usize,
        available: usize,
    },

    #[error("hex dump bytes per line must be between 1 and usize::MAX / 3")]
    InvalidBytesPerLine,

    /// A frame glyph set did not contain exactly 11 glyphs.
    #[error("frame glyph set must have 11 glyphs, got {0}")]
    InvalidGlyphSet(usize),

    /// A sink failed while processing or disposing. `index` is the sink's
    /// position in the dispatcher's sink list.
    #[error("sink #{index} failed: {source}")]
    Sink {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn sink(index: usize, source: Error) -> Self {
        Error::Sink {
            index,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
