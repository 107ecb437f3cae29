//! Codec for `PhysicalColumn`
//!
//! Format:
//! - name (string)
//! - data type (see `DataTypeCodec`)
//! - comment (nullable string)

use std::io::{Read, Write};

use super::data_type::DataTypeCodec;
use crate::codec::{
    resolve_member_tables, CodecResult, CodecSnapshot, Compatibility, DataInputExt,
    DataOutputExt, DecodeLimits, TypeCodec,
};
use crate::schema::{DataType, PhysicalColumn};

/// Codec for `PhysicalColumn` values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalColumnCodec {
    data_type: DataTypeCodec,
    limits: DecodeLimits,
}

impl PhysicalColumnCodec {
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

impl Default for PhysicalColumnCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCodec for PhysicalColumnCodec {
    type Value = PhysicalColumn;

    const CODEC_ID: &'static str = "physical_column";
    const VALUE_TYPE: &'static str = "PhysicalColumn";

    fn is_immutable_type(&self) -> bool {
        false
    }

    fn create_instance(&self) -> PhysicalColumn {
        PhysicalColumn::new("unknown", DataType::bigint())
    }

    fn deep_copy(&self, value: &PhysicalColumn) -> PhysicalColumn {
        PhysicalColumn {
            name: value.name.clone(),
            data_type: self.data_type.deep_copy(&value.data_type),
            comment: value.comment.clone(),
        }
    }

    fn encode<W: Write + ?Sized>(&self, value: &PhysicalColumn, out: &mut W) -> CodecResult<()> {
        out.write_string(&value.name)?;
        self.data_type.encode(&value.data_type, out)?;
        out.write_nullable_string(value.comment.as_deref())
    }

    fn decode<R: Read + ?Sized>(&self, input: &mut R) -> CodecResult<PhysicalColumn> {
        let name = input.read_string(self.limits)?;
        let data_type = self.data_type.decode(input)?;
        let comment = input.read_nullable_string(self.limits)?;
        Ok(PhysicalColumn {
            name,
            data_type,
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
