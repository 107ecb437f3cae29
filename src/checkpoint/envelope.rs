//! Checkpoint envelope framing
//!
//! ```text
//! magic            4 bytes  "CDCK"
//! format_version   u8       1
//! descriptor_len   u32 BE
//! descriptor       CodecSnapshot bytes
//! value_count      u32 BE
//! payload_len      u32 BE
//! payload          value_count encoded values
//! checksum         u32 BE   CRC32 of every preceding byte
//! ```
//!
//! This module only frames and verifies bytes. Descriptor interpretation and
//! value decoding happen in the parent module.

use crc32fast::Hasher;

use crate::codec::{CodecError, CodecResult, DataInputExt, DataOutputExt};

pub const CHECKPOINT_MAGIC: [u8; 4] = *b"CDCK";
pub const CHECKPOINT_FORMAT_VERSION: u8 = 1;

/// magic + version + three u32 lengths/counts + checksum
const MIN_ENVELOPE_LEN: usize = 4 + 1 + 4 + 4 + 4 + 4;

/// Borrowed view of a verified envelope.
///
/// Only the framing has been checked. The descriptor and payload bytes are
/// still uninterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    /// Serialized `CodecSnapshot` of the writing codec
    pub descriptor: &'a [u8],
    /// Number of values the writer encoded
    pub value_count: u32,
    /// Concatenated encoded values
    pub payload: &'a [u8],
    /// Stored CRC32, already verified against the body
    pub checksum: u32,
}

/// CRC32 (IEEE) of `data`, as stored in the envelope trailer
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn section_len(len: usize, section: &str) -> CodecResult<u32> {
    u32::try_from(len).map_err(|_| {
        CodecError::invalid_record(format!("Checkpoint {} too large: {} bytes", section, len))
    })
}

/// Frame a descriptor and an encoded payload. Returns the envelope bytes and
/// their checksum.
pub fn seal(descriptor: &[u8], value_count: u32, payload: &[u8]) -> CodecResult<(Vec<u8>, u32)> {
    let mut buf = Vec::with_capacity(MIN_ENVELOPE_LEN + descriptor.len() + payload.len());
    buf.extend_from_slice(&CHECKPOINT_MAGIC);
    buf.write_u8(CHECKPOINT_FORMAT_VERSION)?;
    buf.write_u32_be(section_len(descriptor.len(), "descriptor")?)?;
    buf.extend_from_slice(descriptor);
    buf.write_u32_be(value_count)?;
    buf.write_u32_be(section_len(payload.len(), "payload")?)?;
    buf.extend_from_slice(payload);

    let checksum = compute_checksum(&buf);
    buf.write_u32_be(checksum)?;
    Ok((buf, checksum))
}

/// Verify magic, version and checksum, then split the envelope into sections
pub fn open(data: &[u8]) -> CodecResult<Envelope<'_>> {
    if data.len() < MIN_ENVELOPE_LEN {
        return Err(CodecError::malformed(format!(
            "Checkpoint too short: {} bytes",
            data.len()
        )));
    }
    if data[..4] != CHECKPOINT_MAGIC {
        return Err(CodecError::malformed("Not a checkpoint: bad magic")
            .with_details(format!("found: {:02x?}", &data[..4])));
    }

    let (body, mut trailer) = data.split_at(data.len() - 4);
    let stored = trailer.read_u32_be()?;
    let computed = compute_checksum(body);
    if stored != computed {
        return Err(CodecError::malformed("Checkpoint checksum mismatch").with_details(
            format!("stored: {:08x}, computed: {:08x}", stored, computed),
        ));
    }

    let mut cursor = &body[4..];
    let version = cursor.read_u8()?;
    if version != CHECKPOINT_FORMAT_VERSION {
        return Err(CodecError::malformed(format!(
            "Unsupported checkpoint format version: {}",
            version
        )));
    }

    let descriptor = take(&mut cursor, "descriptor")?;
    let value_count = cursor.read_u32_be()?;
    let payload = take(&mut cursor, "payload")?;
    if !cursor.is_empty() {
        return Err(CodecError::malformed(format!(
            "{} unexpected bytes before checkpoint checksum",
            cursor.len()
        )));
    }

    Ok(Envelope {
        descriptor,
        value_count,
        payload,
        checksum: stored,
    })
}

/// Read a u32 length prefix and split off that many bytes
fn take<'a>(cursor: &mut &'a [u8], section: &str) -> CodecResult<&'a [u8]> {
    let len = cursor.read_u32_be()? as usize;
    if len > cursor.len() {
        return Err(CodecError::malformed(format!(
            "Checkpoint {} length {} exceeds remaining {} bytes",
            section,
            len,
            cursor.len()
        )));
    }
    let (head, tail) = cursor.split_at(len);
    *cursor = tail;
    Ok(head)
}
