//! Codec for `Column`
//!
//! Format:
//! - kind (ColumnKind ordinal, i32 BE): PHYSICAL = 0, METADATA = 1
//! - payload of the matching variant codec
//!
//! The kind table is the only place the discriminator is defined. A new column
//! kind adds one member to `ColumnKind`, one variant codec and one arm in each
//! match below.

use std::io::{Read, Write};

use super::data_type::DataTypeCodec;
use super::metadata::MetadataColumnCodec;
use super::physical::PhysicalColumnCodec;
use crate::codec::{
    resolve_member_tables, CodecResult, CodecSnapshot, Compatibility, DecodeLimits, EnumCodec,
    TypeCodec,
};
use crate::config::CodecConfig;
use crate::schema::{Column, ColumnKind, DataType};

/// Tagged-union codec for `Column`.
///
/// The descriptor records the `ColumnKind` and `TypeRoot` tables, so a
/// reordered discriminator is detected at restore instead of misread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCodec {
    kinds: EnumCodec<ColumnKind>,
    physical: PhysicalColumnCodec,
    metadata: MetadataColumnCodec,
}

impl ColumnCodec {
    /// Codec with default decode limits
    pub const fn new() -> Self {
        Self::with_limits(DecodeLimits::DEFAULT)
    }

    /// Codec enforcing `limits` on decoded strings
    pub const fn with_limits(limits: DecodeLimits) -> Self {
        Self {
            kinds: EnumCodec::new(),
            physical: PhysicalColumnCodec::with_limits(limits),
            metadata: MetadataColumnCodec::with_limits(limits),
        }
    }

    /// Codec over explicit member tables, as written by an older codec
    pub fn with_tables(
        kinds: EnumCodec<ColumnKind>,
        data_type: DataTypeCodec,
        limits: DecodeLimits,
    ) -> Self {
        Self {
            kinds,
            physical: PhysicalColumnCodec::with_parts(data_type.clone(), limits),
            metadata: MetadataColumnCodec::with_parts(data_type, limits),
        }
    }

    /// Codec using the limits of `config`
    pub fn from_config(config: &CodecConfig) -> Self {
        Self::with_limits(config.decode_limits())
    }
}

impl Default for ColumnCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCodec for ColumnCodec {
    type Value = Column;

    const CODEC_ID: &'static str = "column";
    const VALUE_TYPE: &'static str = "Column";

    fn is_immutable_type(&self) -> bool {
        false
    }

    fn create_instance(&self) -> Column {
        Column::physical_column("unknown", DataType::bigint())
    }

    fn deep_copy(&self, value: &Column) -> Column {
        match value {
            Column::Physical(c) => Column::Physical(self.physical.deep_copy(c)),
            Column::Metadata(c) => Column::Metadata(self.metadata.deep_copy(c)),
        }
    }

    fn encode<W: Write + ?Sized>(&self, value: &Column, out: &mut W) -> CodecResult<()> {
        match value {
            Column::Physical(c) => {
                self.kinds.encode(&ColumnKind::Physical, out)?;
                self.physical.encode(c, out)
            }
            Column::Metadata(c) => {
                self.kinds.encode(&ColumnKind::Metadata, out)?;
                self.metadata.encode(c, out)
            }
        }
    }

    fn decode<R: Read + ?Sized>(&self, input: &mut R) -> CodecResult<Column> {
        match self.kinds.decode(input)? {
            ColumnKind::Physical => self.physical.decode(input).map(Column::Physical),
            ColumnKind::Metadata => self.metadata.decode(input).map(Column::Metadata),
        }
    }

    fn snapshot_params(&self) -> Vec<String> {
        let mut params = vec![self.kinds.table_param()];
        params.extend(self.physical.snapshot_params());
        params
    }

    /// Restored codecs decode with default limits.
    fn restore(params: &[String]) -> CodecResult<Self> {
        Ok(Self::with_tables(
            EnumCodec::from_table_params(params)?,
            DataTypeCodec::restore(params)?,
            DecodeLimits::DEFAULT,
        ))
    }

    fn resolve_compatibility(&self, previous: &CodecSnapshot<Self>) -> Compatibility<Self> {
        resolve_member_tables(previous, self)
    }
}
