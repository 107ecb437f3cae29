//! Checkpointed codec state
//!
//! Encoded values are persisted together with the descriptor of the codec that
//! wrote them. On restore the descriptor is resolved against the running codec
//! before a single value is decoded:
//!
//! - compatible as-is: decode with the running codec
//! - requires migration: decode with the codec restored from the descriptor
//! - incompatible: refuse the state
//!
//! Envelope corruption (bad magic, unsupported version, checksum mismatch,
//! trailing bytes) is fatal. So is a descriptor or payload that cannot be
//! decoded inside an intact envelope. Both are logged as
//! `CHECKPOINT_CORRUPTED`.

mod envelope;

pub use envelope::{compute_checksum, CHECKPOINT_FORMAT_VERSION, CHECKPOINT_MAGIC};

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use crate::codec::{CodecError, CodecResult, CodecSnapshot, Compatibility, TypeCodec};
use crate::observability::{Event, Logger, Severity};

/// What `write_checkpoint` persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointSummary {
    /// Rendered descriptor of the writing codec
    pub descriptor: String,
    /// Number of values encoded
    pub value_count: u32,
    /// Size of the encoded values alone
    pub payload_bytes: usize,
    /// Size of the whole envelope, trailer included
    pub total_bytes: usize,
    /// CRC32 stored in the trailer
    pub checksum: u32,
}

/// Values recovered from a checkpoint
#[derive(Debug)]
pub struct RestoredState<C: TypeCodec> {
    /// Decoded values in checkpoint order
    pub values: Vec<C::Value>,
    /// Descriptor persisted with the values
    pub descriptor: CodecSnapshot<C>,
    /// True when values were read through a codec restored from `descriptor`
    pub migrated: bool,
}

/// Encode `values` with `codec` and write them, with the codec's descriptor, to `out`
pub fn write_checkpoint<C, W>(
    codec: &C,
    values: &[C::Value],
    out: &mut W,
) -> CodecResult<CheckpointSummary>
where
    C: TypeCodec,
    W: Write + ?Sized,
{
    let descriptor = codec.snapshot();
    let value_count = u32::try_from(values.len()).map_err(|_| {
        CodecError::invalid_record(format!("Too many values for one checkpoint: {}", values.len()))
    })?;

    let mut payload = Vec::new();
    for value in values {
        codec.encode(value, &mut payload)?;
    }

    let (bytes, checksum) = envelope::seal(&descriptor.to_bytes()?, value_count, &payload)?;
    out.write_all(&bytes)?;
    out.flush()?;

    let summary = CheckpointSummary {
        descriptor: descriptor.to_string(),
        value_count,
        payload_bytes: payload.len(),
        total_bytes: bytes.len(),
        checksum,
    };
    Logger::event(
        Event::CheckpointWritten,
        &[
            ("descriptor", &summary.descriptor),
            ("values", &value_count.to_string()),
            ("bytes", &summary.total_bytes.to_string()),
        ],
    );
    Ok(summary)
}

/// Read a checkpoint written by any compatible version of codec type `C`
pub fn read_checkpoint<C, R>(codec: &C, input: &mut R) -> CodecResult<RestoredState<C>>
where
    C: TypeCodec,
    R: Read + ?Sized,
{
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    restore_from_bytes(codec, &data)
}

/// Restore `input` and rewrite it under the running codec's descriptor.
///
/// `MIGRATION_APPLIED` is logged only when the values had to be read through
/// an older codec.
pub fn migrate_checkpoint<C, R, W>(
    codec: &C,
    input: &mut R,
    out: &mut W,
) -> CodecResult<CheckpointSummary>
where
    C: TypeCodec,
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let restored = read_checkpoint(codec, input)?;
    let summary = write_checkpoint(codec, &restored.values, out)?;
    if restored.migrated {
        Logger::event(
            Event::MigrationApplied,
            &[
                ("from", &restored.descriptor.to_string()),
                ("to", &summary.descriptor),
                ("values", &summary.value_count.to_string()),
            ],
        );
    }
    Ok(summary)
}

fn restore_from_bytes<C: TypeCodec>(codec: &C, data: &[u8]) -> CodecResult<RestoredState<C>> {
    let envelope = envelope::open(data).map_err(log_corruption)?;

    let mut descriptor_bytes = envelope.descriptor;
    let descriptor =
        CodecSnapshot::<C>::read_from(&mut descriptor_bytes).map_err(log_corruption)?;
    if !descriptor_bytes.is_empty() {
        return Err(log_corruption(CodecError::malformed(format!(
            "{} trailing bytes after checkpoint descriptor",
            descriptor_bytes.len()
        ))));
    }

    let resolution = descriptor.resolve(codec);
    Logger::event(
        Event::CompatibilityResolved,
        &[
            ("previous", &descriptor.to_string()),
            ("current", &codec.snapshot().to_string()),
            ("resolution", resolution.label()),
        ],
    );

    let (values, migrated) = match resolution {
        Compatibility::CompatibleAsIs => (
            decode_values(codec, envelope.payload, envelope.value_count)
                .map_err(log_corruption)?,
            false,
        ),
        Compatibility::RequiresMigration { previous } => (
            decode_values(&previous, envelope.payload, envelope.value_count)
                .map_err(log_corruption)?,
            true,
        ),
        Compatibility::Incompatible { reason } => {
            let current = codec.snapshot();
            Logger::event(
                Event::IncompatibleFormat,
                &[
                    ("previous", &descriptor.to_string()),
                    ("current", &current.to_string()),
                    ("reason", &reason),
                ],
            );
            return Err(CodecError::incompatible_format(reason, &descriptor, &current));
        }
    };

    Logger::event(
        Event::CheckpointRestored,
        &[
            ("descriptor", &descriptor.to_string()),
            ("values", &values.len().to_string()),
            ("migrated", if migrated { "true" } else { "false" }),
        ],
    );
    Ok(RestoredState {
        values,
        descriptor,
        migrated,
    })
}

/// Log a restore failure as `CHECKPOINT_CORRUPTED` at the error's severity
fn log_corruption(err: CodecError) -> CodecError {
    let severity = if err.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Error
    };
    Logger::log(
        severity,
        Event::CheckpointCorrupted.as_str(),
        &[("code", err.code().code()), ("reason", &err.to_string())],
    );
    err
}

fn decode_values<C: TypeCodec>(codec: &C, payload: &[u8], count: u32) -> CodecResult<Vec<C::Value>> {
    let mut cursor = payload;
    // The count is untrusted; every value takes at least one byte.
    let mut values = Vec::with_capacity((count as usize).min(payload.len()));
    for _ in 0..count {
        values.push(codec.decode(&mut cursor)?);
    }
    if !cursor.is_empty() {
        return Err(CodecError::malformed(format!(
            "{} trailing bytes after {} checkpoint values",
            cursor.len(),
            count
        )));
    }
    Ok(values)
}

/// Write a checkpoint file and fsync it and its directory
pub fn write_checkpoint_file<C: TypeCodec>(
    codec: &C,
    values: &[C::Value],
    path: &Path,
) -> CodecResult<CheckpointSummary> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CodecError::io(
                format!("Failed to create checkpoint directory: {}", parent.display()),
                e,
            )
        })?;
    }

    let mut file = File::create(path).map_err(|e| {
        CodecError::io(
            format!("Failed to create checkpoint file: {}", path.display()),
            e,
        )
    })?;
    let summary = write_checkpoint(codec, values, &mut file)?;
    file.sync_all().map_err(|e| {
        CodecError::io(format!("Failed to fsync checkpoint file: {}", path.display()), e)
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let dir = OpenOptions::new().read(true).open(parent).map_err(|e| {
            CodecError::io(
                format!("Failed to open checkpoint directory: {}", parent.display()),
                e,
            )
        })?;
        dir.sync_all().map_err(|e| {
            CodecError::io(
                format!("Failed to fsync checkpoint directory: {}", parent.display()),
                e,
            )
        })?;
    }

    Ok(summary)
}

/// Read a checkpoint file written by `write_checkpoint_file`
pub fn read_checkpoint_file<C: TypeCodec>(codec: &C, path: &Path) -> CodecResult<RestoredState<C>> {
    let data = fs::read(path).map_err(|e| {
        CodecError::io(
            format!("Failed to read checkpoint file: {}", path.display()),
            e,
        )
    })?;
    restore_from_bytes(codec, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecErrorCode, DecodeLimits, EnumCodec};
    use crate::observability::{capture_events, CapturedLine};
    use crate::schema::{Column, ColumnKind, ColumnPosition, DataType};
    use crate::serializer::{ColumnCodec, DataTypeCodec};
    use std::io::Cursor;

    /// Offset of the payload inside an envelope
    fn payload_offset(bytes: &[u8]) -> usize {
        let descriptor_len = u32::from_be_bytes(bytes[5..9].try_into().unwrap()) as usize;
        9 + descriptor_len + 8
    }

    fn reseal(bytes: &mut [u8]) {
        let body_len = bytes.len() - 4;
        let checksum = compute_checksum(&bytes[..body_len]);
        bytes[body_len..].copy_from_slice(&checksum.to_be_bytes());
    }

    fn events_named<'a>(lines: &'a [CapturedLine], event: &str) -> Vec<&'a CapturedLine> {
        lines.iter().filter(|l| l.event() == event).collect()
    }

    fn restore_column_bytes(bytes: Vec<u8>) -> (CodecError, Vec<CapturedLine>) {
        let (result, lines) =
            capture_events(|| read_checkpoint(&ColumnCodec::new(), &mut Cursor::new(bytes)));
        (result.unwrap_err(), lines)
    }

    fn assert_corruption_logged(lines: &[CapturedLine], err: &CodecError) {
        let corrupted = events_named(lines, "CHECKPOINT_CORRUPTED");
        assert_eq!(corrupted.len(), 1);
        assert!(corrupted[0].stderr);
        let json = corrupted[0].json();
        assert_eq!(json["severity"], "FATAL");
        assert_eq!(json["code"], err.code().code());
        assert!(events_named(lines, "CHECKPOINT_RESTORED").is_empty());
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::physical_column("id", DataType::bigint().not_null()),
            Column::metadata_column_with_key("ts", DataType::timestamp(3), "op_ts"),
        ]
    }

    #[test]
    fn test_write_then_read() {
        let codec = ColumnCodec::new();
        let mut buf = Vec::new();
        let summary = write_checkpoint(&codec, &columns(), &mut buf).unwrap();
        assert_eq!(summary.value_count, 2);
        assert_eq!(summary.total_bytes, buf.len());
        assert_eq!(summary.descriptor, codec.snapshot().to_string());
        assert!(summary.descriptor.starts_with("column@1<Column>[ColumnKind(PHYSICAL,METADATA),"));

        let restored = read_checkpoint(&codec, &mut Cursor::new(buf)).unwrap();
        assert_eq!(restored.values, columns());
        assert!(!restored.migrated);
        assert_eq!(restored.descriptor, codec.snapshot());
    }

    #[test]
    fn test_empty_checkpoint() {
        let codec = ColumnCodec::new();
        let mut buf = Vec::new();
        write_checkpoint(&codec, &[], &mut buf).unwrap();

        let restored = read_checkpoint(&codec, &mut Cursor::new(buf)).unwrap();
        assert!(restored.values.is_empty());
    }

    #[test]
    fn test_reordered_enum_is_migrated() {
        let writer = EnumCodec::with_members(vec![
            ColumnPosition::Last,
            ColumnPosition::First,
            ColumnPosition::Before,
            ColumnPosition::After,
        ])
        .unwrap();
        let values = vec![ColumnPosition::Last, ColumnPosition::After];

        let mut buf = Vec::new();
        write_checkpoint(&writer, &values, &mut buf).unwrap();

        let reader: EnumCodec<ColumnPosition> = EnumCodec::new();
        let restored = read_checkpoint(&reader, &mut Cursor::new(buf)).unwrap();
        assert!(restored.migrated);
        assert_eq!(restored.values, values);
    }

    #[test]
    fn test_incompatible_descriptor_refused() {
        let writer: EnumCodec<ColumnPosition> =
            EnumCodec::with_members(vec![ColumnPosition::First, ColumnPosition::Last]).unwrap();
        let mut buf = Vec::new();
        write_checkpoint(&writer, &[ColumnPosition::Last], &mut buf).unwrap();

        // Descriptor rewritten to name a member the running enum no longer has.
        let mut patched = buf;
        let at = patched
            .windows(5)
            .position(|w| w == b"FIRST")
            .unwrap();
        patched[at..at + 5].copy_from_slice(b"ABOVE");
        reseal(&mut patched);

        let (result, lines) = capture_events(|| {
            read_checkpoint(&EnumCodec::<ColumnPosition>::new(), &mut Cursor::new(patched))
        });
        let err = result.unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::IncompatibleFormat);
        assert!(err.details().unwrap().contains("previous: enum@1<ColumnPosition>[ABOVE,LAST]"));

        let incompatible = events_named(&lines, "INCOMPATIBLE_FORMAT");
        assert_eq!(incompatible.len(), 1);
        assert!(incompatible[0].stderr);
        let json = incompatible[0].json();
        assert_eq!(json["severity"], "FATAL");
        assert_eq!(json["previous"], "enum@1<ColumnPosition>[ABOVE,LAST]");
        assert!(json["reason"].as_str().unwrap().contains("ABOVE"));
        assert!(events_named(&lines, "CHECKPOINT_CORRUPTED").is_empty());
    }

    #[test]
    fn test_foreign_codec_refused() {
        let mut buf = Vec::new();
        write_checkpoint(&DataTypeCodec::new(), &[DataType::int()], &mut buf).unwrap();

        let (err, lines) = restore_column_bytes(buf);
        assert_eq!(err.code(), CodecErrorCode::IncompatibleFormat);

        let incompatible = events_named(&lines, "INCOMPATIBLE_FORMAT");
        assert_eq!(incompatible.len(), 1);
        assert!(incompatible[0].stderr);
        let json = incompatible[0].json();
        assert!(json["previous"].as_str().unwrap().starts_with("data_type@1<DataType>"));
        assert!(json["current"].as_str().unwrap().starts_with("column@1<Column>"));

        let resolved = events_named(&lines, "COMPATIBILITY_RESOLVED");
        assert_eq!(resolved[0].json()["resolution"], "incompatible");
        assert!(!resolved[0].stderr);
    }

    #[test]
    fn test_corruption_detected() {
        let codec = ColumnCodec::new();
        let mut buf = Vec::new();
        write_checkpoint(&codec, &columns(), &mut buf).unwrap();
        let mid = buf.len() / 2;
        buf[mid] ^= 0xff;

        let (err, lines) = restore_column_bytes(buf);
        assert_eq!(err.code(), CodecErrorCode::MalformedInput);
        assert!(err.is_fatal());
        assert_corruption_logged(&lines, &err);
    }

    #[test]
    fn test_bad_magic_logged_as_corruption() {
        let mut buf = Vec::new();
        write_checkpoint(&ColumnCodec::new(), &columns(), &mut buf).unwrap();
        buf[0] = b'X';

        let (err, lines) = restore_column_bytes(buf);
        assert_eq!(err.code(), CodecErrorCode::MalformedInput);
        assert_corruption_logged(&lines, &err);
        assert!(events_named(&lines, "COMPATIBILITY_RESOLVED").is_empty());
    }

    #[test]
    fn test_unreadable_descriptor_logged_as_corruption() {
        let mut buf = Vec::new();
        write_checkpoint(&ColumnCodec::new(), &columns(), &mut buf).unwrap();
        // Length prefix of the codec id.
        buf[9..13].copy_from_slice(&(-1i32).to_be_bytes());
        reseal(&mut buf);

        let (err, lines) = restore_column_bytes(buf);
        assert_eq!(err.code(), CodecErrorCode::MalformedInput);
        assert_corruption_logged(&lines, &err);
    }

    #[test]
    fn test_bad_discriminator_in_payload_logged_as_corruption() {
        let mut buf = Vec::new();
        write_checkpoint(&ColumnCodec::new(), &columns(), &mut buf).unwrap();
        let at = payload_offset(&buf);
        buf[at..at + 4].copy_from_slice(&7i32.to_be_bytes());
        reseal(&mut buf);

        let (err, lines) = restore_column_bytes(buf);
        assert_eq!(err.code(), CodecErrorCode::UnknownVariant);
        assert_corruption_logged(&lines, &err);
        assert_eq!(
            events_named(&lines, "COMPATIBILITY_RESOLVED")[0].json()["resolution"],
            "compatible_as_is"
        );
    }

    #[test]
    fn test_trailing_payload_bytes_logged_as_corruption() {
        let mut buf = Vec::new();
        write_checkpoint(&ColumnCodec::new(), &columns(), &mut buf).unwrap();
        // Claim one value where two were written.
        let count_at = payload_offset(&buf) - 8;
        buf[count_at..count_at + 4].copy_from_slice(&1u32.to_be_bytes());
        reseal(&mut buf);

        let (err, lines) = restore_column_bytes(buf);
        assert_eq!(err.code(), CodecErrorCode::MalformedInput);
        assert!(err.to_string().contains("trailing bytes"));
        assert_corruption_logged(&lines, &err);
    }

    #[test]
    fn test_reordered_column_kinds_are_migrated() {
        let writer = ColumnCodec::with_tables(
            EnumCodec::with_members(vec![ColumnKind::Metadata, ColumnKind::Physical]).unwrap(),
            DataTypeCodec::new(),
            DecodeLimits::DEFAULT,
        );
        let mut buf = Vec::new();
        write_checkpoint(&writer, &columns(), &mut buf).unwrap();
        // PHYSICAL was written as ordinal 1 by the old table.
        let at = payload_offset(&buf);
        assert_eq!(&buf[at..at + 4], &[0, 0, 0, 1]);

        let restored = read_checkpoint(&ColumnCodec::new(), &mut Cursor::new(buf)).unwrap();
        assert!(restored.migrated);
        assert_eq!(restored.values, columns());
    }

    #[test]
    fn test_migrate_rewrites_descriptor() {
        let writer = EnumCodec::with_members(vec![
            ColumnPosition::After,
            ColumnPosition::Before,
            ColumnPosition::Last,
            ColumnPosition::First,
        ])
        .unwrap();
        let values = vec![ColumnPosition::First, ColumnPosition::Before];
        let mut old = Vec::new();
        write_checkpoint(&writer, &values, &mut old).unwrap();

        let current = EnumCodec::<ColumnPosition>::new();
        let mut migrated = Vec::new();
        let summary = migrate_checkpoint(&current, &mut Cursor::new(old), &mut migrated).unwrap();
        assert_eq!(summary.descriptor, current.snapshot().to_string());

        let restored = read_checkpoint(&current, &mut Cursor::new(migrated)).unwrap();
        assert!(!restored.migrated);
        assert_eq!(restored.values, values);
    }

    #[test]
    fn test_migrating_reordered_state_logs_one_warning() {
        let writer = EnumCodec::with_members(vec![ColumnPosition::Last, ColumnPosition::First])
            .unwrap();
        let mut old = Vec::new();
        write_checkpoint(&writer, &[ColumnPosition::First], &mut old).unwrap();

        let current = EnumCodec::<ColumnPosition>::new();
        let (result, lines) = capture_events(|| {
            migrate_checkpoint(&current, &mut Cursor::new(old), &mut Vec::<u8>::new())
        });
        result.unwrap();

        let applied = events_named(&lines, "MIGRATION_APPLIED");
        assert_eq!(applied.len(), 1);
        assert!(!applied[0].stderr);
        let json = applied[0].json();
        assert_eq!(json["severity"], "WARN");
        assert_eq!(json["from"], "enum@1<ColumnPosition>[LAST,FIRST]");
        assert_eq!(json["to"], current.snapshot().to_string());
        assert_eq!(json["values"], "1");
    }

    #[test]
    fn test_migrating_compatible_state_logs_no_migration() {
        let codec = ColumnCodec::new();
        let mut old = Vec::new();
        write_checkpoint(&codec, &columns(), &mut old).unwrap();

        let mut rewritten = Vec::new();
        let (result, lines) = capture_events(|| {
            migrate_checkpoint(&codec, &mut Cursor::new(old.clone()), &mut rewritten)
        });
        result.unwrap();
        assert_eq!(rewritten, old);

        assert!(events_named(&lines, "MIGRATION_APPLIED").is_empty());
        assert_eq!(events_named(&lines, "CHECKPOINT_RESTORED").len(), 1);
        assert_eq!(events_named(&lines, "CHECKPOINT_WRITTEN").len(), 1);
        assert!(lines.iter().all(|l| !l.stderr));
    }
}
