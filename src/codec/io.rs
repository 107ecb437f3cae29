//! Primitive value framing on top of `std::io`
//!
//! Wire conventions shared by every codec:
//! - Integers are big-endian
//! - `i32` occupies 4 bytes, `u8` and `bool` 1 byte
//! - Strings are an `i32` byte length followed by UTF-8 bytes
//! - Nullable strings use length `-1` for an absent value
//!
//! Any `Write` is a byte sink and any `Read` is a byte source; the extension
//! traits below add the primitive operations to both.

use std::io::{Read, Write};

use super::errors::{CodecError, CodecResult};

/// Length marker for an absent nullable string
const NULL_LENGTH: i32 = -1;

/// Default upper bound on a single decoded string (16 MiB)
pub const DEFAULT_MAX_STRING_BYTES: u32 = 16 * 1024 * 1024;

/// Bounds applied while decoding untrusted bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest string length accepted before allocation
    pub max_string_bytes: u32,
}

impl DecodeLimits {
    /// Limits used by the process-wide codec instances
    pub const DEFAULT: DecodeLimits = DecodeLimits {
        max_string_bytes: DEFAULT_MAX_STRING_BYTES,
    };

    /// Create limits with an explicit string bound
    pub const fn new(max_string_bytes: u32) -> Self {
        Self { max_string_bytes }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Primitive writes for a byte sink
pub trait DataOutputExt: Write {
    /// Write a big-endian `i32`
    fn write_i32_be(&mut self, value: i32) -> CodecResult<()> {
        self.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write a big-endian `u32`
    fn write_u32_be(&mut self, value: u32) -> CodecResult<()> {
        self.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write a single byte
    fn write_u8(&mut self, value: u8) -> CodecResult<()> {
        self.write_all(&[value])?;
        Ok(())
    }

    /// Write a bool as one byte (0 or 1)
    fn write_bool(&mut self, value: bool) -> CodecResult<()> {
        self.write_u8(u8::from(value))
    }

    /// Write a length-prefixed UTF-8 string
    fn write_string(&mut self, value: &str) -> CodecResult<()> {
        let len = i32::try_from(value.len()).map_err(|_| {
            CodecError::invalid_record(format!("String too long to encode: {} bytes", value.len()))
        })?;
        self.write_i32_be(len)?;
        self.write_all(value.as_bytes())?;
        Ok(())
    }

    /// Write a string that may be absent
    fn write_nullable_string(&mut self, value: Option<&str>) -> CodecResult<()> {
        match value {
            Some(s) => self.write_string(s),
            None => self.write_i32_be(NULL_LENGTH),
        }
    }
}

impl<W: Write + ?Sized> DataOutputExt for W {}

/// Primitive reads for a byte source
pub trait DataInputExt: Read {
    /// Read a big-endian `i32`
    fn read_i32_be(&mut self) -> CodecResult<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    /// Read a big-endian `u32`
    fn read_u32_be(&mut self) -> CodecResult<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Read a single byte
    fn read_u8(&mut self) -> CodecResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Read a bool; any byte other than 0 or 1 is malformed
    fn read_bool(&mut self) -> CodecResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::malformed(format!("Invalid bool byte: {}", other))),
        }
    }

    /// Read a length-prefixed UTF-8 string
    fn read_string(&mut self, limits: DecodeLimits) -> CodecResult<String> {
        let len = self.read_i32_be()?;
        if len < 0 {
            return Err(CodecError::malformed(format!("Negative string length: {}", len)));
        }
        read_utf8(self, len as u32, limits)
    }

    /// Read a string that may be absent
    fn read_nullable_string(&mut self, limits: DecodeLimits) -> CodecResult<Option<String>> {
        match self.read_i32_be()? {
            NULL_LENGTH => Ok(None),
            len if len < 0 => Err(CodecError::malformed(format!(
                "Invalid nullable string length: {}",
                len
            ))),
            len => read_utf8(self, len as u32, limits).map(Some),
        }
    }
}

impl<R: Read + ?Sized> DataInputExt for R {}

fn read_utf8<R: Read + ?Sized>(reader: &mut R, len: u32, limits: DecodeLimits) -> CodecResult<String> {
    if len > limits.max_string_bytes {
        return Err(CodecError::malformed(format!("String length {} exceeds limit", len))
            .with_details(format!("max_string_bytes: {}", limits.max_string_bytes)));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| CodecError::malformed(format!("Invalid UTF-8: {}", e)))
}
