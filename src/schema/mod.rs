//! Schema-change data model
//!
//! Values carried by add-column schema change events: columns, their data
//! types and insertion positions. These types hold no codec logic; the wire
//! format lives in `serializer`.

mod column;
mod event;
mod types;

pub use column::{Column, ColumnKind, MetadataColumn, PhysicalColumn};
pub use event::{ColumnPosition, ColumnWithPosition};
pub use types::{DataType, TypeRoot};
