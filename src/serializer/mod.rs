//! Concrete codecs for schema-change values
//!
//! Each codec is a plain immutable value. The statics below are the shared
//! instances used by the state layer; they are built at compile time and safe
//! for concurrent use without synchronization.
//!
//! ```ignore
//! use schema_codec::codec::TypeCodec;
//! use schema_codec::serializer::COLUMN_CODEC;
//!
//! let mut buf = Vec::new();
//! COLUMN_CODEC.encode(&column, &mut buf)?;
//! let decoded = COLUMN_CODEC.decode(&mut buf.as_slice())?;
//! ```

mod column;
mod column_with_position;
mod data_type;
mod metadata;
mod physical;

pub use column::ColumnCodec;
pub use column_with_position::ColumnWithPositionCodec;
pub use data_type::DataTypeCodec;
pub use metadata::MetadataColumnCodec;
pub use physical::PhysicalColumnCodec;

use crate::codec::EnumCodec;
use crate::schema::ColumnPosition;

/// Shared `Column` codec
pub static COLUMN_CODEC: ColumnCodec = ColumnCodec::new();

/// Shared `ColumnWithPosition` codec (anchors unchecked)
pub static COLUMN_WITH_POSITION_CODEC: ColumnWithPositionCodec = ColumnWithPositionCodec::new();

/// Shared `ColumnPosition` codec
pub static COLUMN_POSITION_CODEC: EnumCodec<ColumnPosition> = EnumCodec::new();
