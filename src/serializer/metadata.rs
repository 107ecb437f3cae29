//! Codec for `MetadataColumn`
//!
//! Format:
//! - name (string)
//! - data type (see `DataTypeCodec`)
//! - metadata key (nullable string)
//! - comment (nullable string)

use std::io::{Read, Write};

use super::data_type::DataTypeCodec;
use crate::codec::{
    resolve_member_tables, CodecResult, CodecSnapshot, Compatibility, DataInputExt,
    DataOutputExt, DecodeLimits, TypeCodec,
};
use crate::schema::{DataType, MetadataColumn};

/// Codec for `MetadataColumn` values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataColumnCodec {
    data_type: DataTypeCodec,
    limits: DecodeLimits,
}

impl MetadataColumnCodec {
    /// Codec with default decode limits
    pub const fn new() -> Self {
        Self::with_limits(DecodeLimits::DEFAULT)
    }

    /// Codec enforcing `limits` on decoded strings
    pub const fn with_limits(limits: DecodeLimits) -> Self {
        Self::with_parts(DataTypeCodec::new(), limits)
    }

    /// Codec over an explicit data type codec, as restored from a descriptor
    pub const fn with_parts(data_type: DataTypeCodec, limits: DecodeLimits) -> Self {
        Self { data_type, limits }
    }
}

impl Default for MetadataColumnCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCodec for MetadataColumnCodec {
    type Value = MetadataColumn;

    const CODEC_ID: &'static str = "metadata_column";
    const VALUE_TYPE: &'static str = "MetadataColumn";

    fn is_immutable_type(&self) -> bool {
        false
    }

    fn create_instance(&self) -> MetadataColumn {
        MetadataColumn::new("unknown", DataType::bigint())
    }

    fn deep_copy(&self, value: &MetadataColumn) -> MetadataColumn {
        MetadataColumn {
            name: value.name.clone(),
            data_type: self.data_type.deep_copy(&value.data_type),
            metadata_key: value.metadata_key.clone(),
            comment: value.comment.clone(),
        }
    }

    fn encode<W: Write + ?Sized>(&self, value: &MetadataColumn, out: &mut W) -> CodecResult<()> {
        out.write_string(&value.name)?;
        self.data_type.encode(&value.data_type, out)?;
        out.write_nullable_string(value.metadata_key.as_deref())?;
        out.write_nullable_string(value.comment.as_deref())
    }

    fn decode<R: Read + ?Sized>(&self, input: &mut R) -> CodecResult<MetadataColumn> {
        let name = input.read_string(self.limits)?;
        let data_type = self.data_type.decode(input)?;
        let metadata_key = input.read_nullable_string(self.limits)?;
        let comment = input.read_nullable_string(self.limits)?;
        Ok(MetadataColumn {
            name,
            data_type,
            metadata_key,
            comment,
        })
    }

    fn snapshot_params(&self) -> Vec<String> {
        self.data_type.snapshot_params()
    }

    fn restore(params: &[String]) -> CodecResult<Self> {
        Ok(Self::with_parts(
            DataTypeCodec::restore(params)?,
            DecodeLimits::DEFAULT,
        ))
    }

    fn resolve_compatibility(&self, previous: &CodecSnapshot<Self>) -> Compatibility<Self> {
        resolve_member_tables(previous, self)
    }
}
