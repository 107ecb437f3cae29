//! Codec for `ColumnWithPosition`
//!
//! Format (field order is part of the persisted format):
//! - add_column (see `ColumnCodec`)
//! - position (ColumnPosition ordinal, i32 BE)
//! - existing_column presence (i32 BE, 0 = absent, 1 = present)
//! - existing_column (only when present)
//!
//! Under `AnchorPolicy::Enforce`, records whose anchor presence does not match
//! their position are refused on both encode and decode.

use std::io::{Read, Write};

use super::column::ColumnCodec;
use crate::codec::{
    resolve_member_tables, CodecError, CodecResult, CodecSnapshot, Compatibility, DataInputExt,
    DataOutputExt, EnumCodec, TypeCodec,
};
use crate::config::{AnchorPolicy, CodecConfig};
use crate::schema::{Column, ColumnPosition, ColumnWithPosition, DataType};

const ANCHOR_ABSENT: i32 = 0;
const ANCHOR_PRESENT: i32 = 1;

/// Composite codec for `ColumnWithPosition`.
///
/// The descriptor records the nested `ColumnKind`, `TypeRoot` and
/// `ColumnPosition` tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnWithPositionCodec {
    columns: ColumnCodec,
    positions: EnumCodec<ColumnPosition>,
    anchor_policy: AnchorPolicy,
}

impl ColumnWithPositionCodec {
    /// Codec with default limits and unchecked anchors
    pub const fn new() -> Self {
        Self {
            columns: ColumnCodec::new(),
            positions: EnumCodec::new(),
            anchor_policy: AnchorPolicy::Unchecked,
        }
    }

    /// Codec using the limits and anchor policy of `config`
    pub fn from_config(config: &CodecConfig) -> Self {
        Self {
            columns: ColumnCodec::with_limits(config.decode_limits()),
            positions: EnumCodec::new(),
            anchor_policy: config.anchor_policy,
        }
    }

    /// Codec over explicit nested codecs, as written by an older codec
    pub fn with_tables(columns: ColumnCodec, positions: EnumCodec<ColumnPosition>) -> Self {
        Self {
            columns,
            positions,
            anchor_policy: AnchorPolicy::Unchecked,
        }
    }

    /// Anchor policy applied on encode and decode
    pub fn anchor_policy(&self) -> AnchorPolicy {
        self.anchor_policy
    }

    fn check_anchor(&self, record: &ColumnWithPosition) -> CodecResult<()> {
        if self.anchor_policy == AnchorPolicy::Enforce && !record.is_anchor_consistent() {
            let expectation = if record.position.requires_anchor() {
                "requires"
            } else {
                "forbids"
            };
            return Err(CodecError::invalid_record(format!(
                "Position {} {} an existing column",
                record.position, expectation
            ))
            .with_details(format!("add_column: {}", record.add_column.name())));
        }
        Ok(())
    }
}

impl Default for ColumnWithPositionCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCodec for ColumnWithPositionCodec {
    type Value = ColumnWithPosition;

    const CODEC_ID: &'static str = "column_with_position";
    const VALUE_TYPE: &'static str = "ColumnWithPosition";

    fn is_immutable_type(&self) -> bool {
        false
    }

    fn create_instance(&self) -> ColumnWithPosition {
        ColumnWithPosition::new(Column::physical_column("unknown", DataType::bigint()))
    }

    fn deep_copy(&self, value: &ColumnWithPosition) -> ColumnWithPosition {
        ColumnWithPosition {
            add_column: self.columns.deep_copy(&value.add_column),
            position: value.position,
            existing_column: value
                .existing_column
                .as_ref()
                .map(|c| self.columns.deep_copy(c)),
        }
    }

    fn encode<W: Write + ?Sized>(
        &self,
        value: &ColumnWithPosition,
        out: &mut W,
    ) -> CodecResult<()> {
        self.check_anchor(value)?;
        self.columns.encode(&value.add_column, out)?;
        self.positions.encode(&value.position, out)?;
        match value.existing_column {
            None => out.write_i32_be(ANCHOR_ABSENT),
            Some(ref existing) => {
                out.write_i32_be(ANCHOR_PRESENT)?;
                self.columns.encode(existing, out)
            }
        }
    }

    fn decode<R: Read + ?Sized>(&self, input: &mut R) -> CodecResult<ColumnWithPosition> {
        let add_column = self.columns.decode(input)?;
        let position = self.positions.decode(input)?;
        let existing_column = match input.read_i32_be()? {
            ANCHOR_ABSENT => None,
            ANCHOR_PRESENT => Some(self.columns.decode(input)?),
            other => {
                return Err(CodecError::malformed(format!(
                    "Invalid existing column marker: {}",
                    other
                )))
            }
        };
        let record = ColumnWithPosition {
            add_column,
            position,
            existing_column,
        };
        self.check_anchor(&record)?;
        Ok(record)
    }

    fn snapshot_params(&self) -> Vec<String> {
        let mut params = self.columns.snapshot_params();
        params.push(self.positions.table_param());
        params
    }

    fn restore(params: &[String]) -> CodecResult<Self> {
        Ok(Self::with_tables(
            ColumnCodec::restore(params)?,
            EnumCodec::from_table_params(params)?,
        ))
    }

    fn resolve_compatibility(&self, previous: &CodecSnapshot<Self>) -> Compatibility<Self> {
        resolve_member_tables(previous, self)
    }
}
