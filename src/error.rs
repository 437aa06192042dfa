//! Error taxonomy shared by every codec entry point.
//!
//! All errors are returned, never thrown: the codec stops at the first
//! error, invokes no further mesh callbacks, flushes no buffered output, and
//! leaves the stream position undefined from that point on.

use core::fmt;

/// The kind of failure that stopped a codec call.
///
/// Precedence when several conditions could apply, highest first:
/// argument validation, locale check, stream errors, format-parse errors,
/// semantic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unknown,

    NullMemblock,
    InvalidMemblockSize,

    StreamError,
    StreamEndOfFile,
    StreamShortRead,
    StreamShortWrite,
    StreamLengthMismatch,

    StlUnknownFormat,
    StlAsciiParseError,
    StlAsciiInvalidKeyword,
    StlAsciiBadSolidName,

    StlBinaryBadHeader,
    StlBinaryUnsupportedByteOrder,

    BadLcNumeric,

    ZipBadSignature,
    ZipUnsupportedVersion,
    ZipInconsistentSize,

    TaskStopped,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::Unknown => "unknown error",
            ErrorKind::NullMemblock => "memblock is null",
            ErrorKind::InvalidMemblockSize => "memblock has zero size",
            ErrorKind::StreamError => "stream I/O error",
            ErrorKind::StreamEndOfFile => "unexpected end of stream",
            ErrorKind::StreamShortRead => "short read from stream",
            ErrorKind::StreamShortWrite => "short write to stream",
            ErrorKind::StreamLengthMismatch => {
                "triangle count does not match remaining stream size"
            }
            ErrorKind::StlUnknownFormat => "could not determine STL format",
            ErrorKind::StlAsciiParseError => "STL ASCII parse error",
            ErrorKind::StlAsciiInvalidKeyword => "unexpected STL ASCII keyword",
            ErrorKind::StlAsciiBadSolidName => "malformed solid name",
            ErrorKind::StlBinaryBadHeader => "truncated STL binary header",
            ErrorKind::StlBinaryUnsupportedByteOrder => "unsupported byte order",
            ErrorKind::BadLcNumeric => "LC_NUMERIC locale is not C/POSIX",
            ErrorKind::ZipBadSignature => "bad ZIP record signature",
            ErrorKind::ZipUnsupportedVersion => "unsupported ZIP version needed to extract",
            ErrorKind::ZipInconsistentSize => "inconsistent ZIP size fields",
            ErrorKind::TaskStopped => "aborted by task_progress callback",
        };
        f.write_str(text)
    }
}

/// A codec error: a [`ErrorKind`] plus, for ASCII parse failures, the
/// 1-based input line number at which it was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    line: Option<u32>,
}

impl Error {
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self { kind, line: None }
    }

    #[must_use]
    pub const fn at_line(kind: ErrorKind, line: u32) -> Self {
        Self {
            kind,
            line: Some(line),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub const fn line(&self) -> Option<u32> {
        self.line
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {line})", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::new(ErrorKind::StreamEndOfFile),
            _ => Error::new(ErrorKind::StreamError),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
