//! schema-codec - Versioned binary codecs for CDC schema-change state
//!
//! Serializes the column definitions carried by schema-change events
//! (`Column`, `ColumnWithPosition`) so that state written by one release can
//! be restored by a later one.
//!
//! Subsystems:
//! - `codec`: codec contract, byte framing, enum codec, compatibility descriptors
//! - `schema`: column and data type model
//! - `serializer`: concrete codecs and shared instances
//! - `checkpoint`: descriptor-tagged persisted state
//! - `observability`: structured logging
//! - `config`: codec configuration

pub mod checkpoint;
pub mod codec;
pub mod config;
pub mod observability;
pub mod schema;
pub mod serializer;
