//! Codec for `DataType`
//!
//! Format:
//! - root (TypeRoot ordinal, i32 BE)
//! - nullable (u8, 0 or 1)
//! - parameters (i32 BE each, count fixed by the root)

use std::io::{Read, Write};

use crate::codec::{
    resolve_member_tables, CodecError, CodecResult, CodecSnapshot, Compatibility, DataInputExt,
    DataOutputExt, EnumCodec, TypeCodec,
};
use crate::schema::{DataType, TypeRoot};

/// Codec for column data types; its descriptor records the `TypeRoot` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeCodec {
    roots: EnumCodec<TypeRoot>,
}

impl DataTypeCodec {
    /// Codec over the current `TypeRoot` declaration order
    pub const fn new() -> Self {
        Self::with_roots(EnumCodec::new())
    }

    /// Codec over an explicit root table, as written by an older codec
    pub const fn with_roots(roots: EnumCodec<TypeRoot>) -> Self {
        Self { roots }
    }
}

impl Default for DataTypeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCodec for DataTypeCodec {
    type Value = DataType;

    const CODEC_ID: &'static str = "data_type";
    const VALUE_TYPE: &'static str = "DataType";

    fn is_immutable_type(&self) -> bool {
        true
    }

    fn create_instance(&self) -> DataType {
        DataType::bigint()
    }

    fn deep_copy(&self, value: &DataType) -> DataType {
        value.clone()
    }

    fn encode<W: Write + ?Sized>(&self, value: &DataType, out: &mut W) -> CodecResult<()> {
        self.roots.encode(&value.root(), out)?;
        out.write_bool(value.is_nullable())?;
        for param in value.parameters() {
            out.write_i32_be(*param)?;
        }
        Ok(())
    }

    fn decode<R: Read + ?Sized>(&self, input: &mut R) -> CodecResult<DataType> {
        let root = self.roots.decode(input)?;
        let nullable = input.read_bool()?;
        let mut parameters = Vec::with_capacity(root.parameter_count());
        for _ in 0..root.parameter_count() {
            parameters.push(input.read_i32_be()?);
        }
        DataType::from_parts(root, nullable, parameters)
            .ok_or_else(|| CodecError::malformed(format!("Invalid parameters for {:?}", root)))
    }

    fn snapshot_params(&self) -> Vec<String> {
        vec![self.roots.table_param()]
    }

    fn restore(params: &[String]) -> CodecResult<Self> {
        Ok(Self::with_roots(EnumCodec::from_table_params(params)?))
    }

    fn resolve_compatibility(&self, previous: &CodecSnapshot<Self>) -> Compatibility<Self> {
        resolve_member_tables(previous, self)
    }
}
