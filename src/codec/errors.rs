//! Codec error types
//!
//! Error codes:
//! - CODEC_UNKNOWN_VARIANT (FATAL severity)
//! - CODEC_ILLEGAL_VARIANT (ERROR severity)
//! - CODEC_INCOMPATIBLE_FORMAT (FATAL severity)
//! - CODEC_MALFORMED_INPUT (FATAL severity)
//! - CODEC_INVALID_RECORD (ERROR severity)
//! - CODEC_IO (ERROR severity)
//!
//! Every failure of an encode, decode, copy or restore call is reported through
//! `CodecError`, including failures of the underlying byte stream.

use std::fmt;
use std::io;

/// Severity levels for codec errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The call fails, the caller may continue with other values
    Error,
    /// The state being read cannot be trusted; the restore must abort
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Codec error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorCode {
    /// Tag or ordinal outside the known set at decode time
    UnknownVariant,
    /// Value passed to encode is not covered by the codec's variant table
    IllegalVariant,
    /// Persisted descriptor does not match the running codec
    IncompatibleFormat,
    /// Byte stream is structurally invalid (lengths, UTF-8, checksum, magic)
    MalformedInput,
    /// Record violates the configured field relationship policy
    InvalidRecord,
    /// Underlying stream failure
    Io,
}

impl CodecErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            CodecErrorCode::UnknownVariant => "CODEC_UNKNOWN_VARIANT",
            CodecErrorCode::IllegalVariant => "CODEC_ILLEGAL_VARIANT",
            CodecErrorCode::IncompatibleFormat => "CODEC_INCOMPATIBLE_FORMAT",
            CodecErrorCode::MalformedInput => "CODEC_MALFORMED_INPUT",
            CodecErrorCode::InvalidRecord => "CODEC_INVALID_RECORD",
            CodecErrorCode::Io => "CODEC_IO",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            CodecErrorCode::UnknownVariant => Severity::Fatal,
            CodecErrorCode::IllegalVariant => Severity::Error,
            CodecErrorCode::IncompatibleFormat => Severity::Fatal,
            CodecErrorCode::MalformedInput => Severity::Fatal,
            CodecErrorCode::InvalidRecord => Severity::Error,
            CodecErrorCode::Io => Severity::Error,
        }
    }

    /// Maps the code onto the `io::ErrorKind` used when the error crosses
    /// into plain I/O code.
    fn io_kind(&self) -> io::ErrorKind {
        match self {
            CodecErrorCode::IllegalVariant | CodecErrorCode::InvalidRecord => {
                io::ErrorKind::InvalidInput
            }
            _ => io::ErrorKind::InvalidData,
        }
    }
}

impl fmt::Display for CodecErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Codec error type with full context
#[derive(Debug)]
pub struct CodecError {
    /// Error code
    code: CodecErrorCode,
    /// Human-readable message
    message: String,
    /// Optional details about the error context
    details: Option<String>,
    /// Underlying IO error if applicable
    source: Option<io::Error>,
}

impl CodecError {
    fn new(code: CodecErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create an unknown variant error for a tag read from the stream
    pub fn unknown_variant(type_name: &str, tag: i32, known: usize) -> Self {
        Self::new(
            CodecErrorCode::UnknownVariant,
            format!("Unknown {} tag: {}", type_name, tag),
        )
        .with_details(format!("known_tags: [0, {})", known))
    }

    /// Create an illegal variant error for a value the codec cannot encode
    pub fn illegal_variant(type_name: &str, value: impl fmt::Debug) -> Self {
        Self::new(
            CodecErrorCode::IllegalVariant,
            format!("Illegal {} value: {:?}", type_name, value),
        )
    }

    /// Create an incompatible format error naming both descriptors
    pub fn incompatible_format(
        reason: impl Into<String>,
        previous: impl fmt::Display,
        current: impl fmt::Display,
    ) -> Self {
        Self::new(CodecErrorCode::IncompatibleFormat, reason)
            .with_details(format!("previous: {}, current: {}", previous, current))
    }

    /// Create a malformed input error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(CodecErrorCode::MalformedInput, message)
    }

    /// Create an invalid record error
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::new(CodecErrorCode::InvalidRecord, message)
    }

    /// Create a stream failure error
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: CodecErrorCode::Io,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Attach context details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Returns the error code
    pub fn code(&self) -> CodecErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error must abort the surrounding restore
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        // A codec error that already crossed into io::Error comes back unchanged.
        if err.get_ref().map_or(false, |inner| inner.is::<CodecError>()) {
            if let Some(inner) = err.into_inner() {
                if let Ok(codec) = inner.downcast::<CodecError>() {
                    return *codec;
                }
            }
            return CodecError::malformed("Lost codec error while unwrapping io::Error");
        }
        let message = match err.kind() {
            io::ErrorKind::UnexpectedEof => "Unexpected end of stream",
            _ => "Stream operation failed",
        };
        CodecError::io(message, err)
    }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        if err.code == CodecErrorCode::Io {
            if let Some(source) = err.source {
                return source;
            }
        }
        io::Error::new(err.code.io_kind(), err)
    }
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
