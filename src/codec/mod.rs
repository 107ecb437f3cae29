//! Codec core
//!
//! Defines the contract every schema-event codec follows, the primitive byte
//! framing they share, the ordinal enum codec and the compatibility descriptor
//! persisted with encoded state.
//!
//! # Design Principles
//!
//! - Codecs are immutable after construction and hold no per-call state
//! - Byte streams are supplied per call and owned by the caller for its duration
//! - Decode always allocates fresh values
//! - Unknown tags fail the call; nothing falls back to a default value
//! - Incompatible descriptors are refused before any state is decoded

mod enum_codec;
mod errors;
mod io;
mod snapshot;

pub use enum_codec::{parse_table_param, EnumCodec, OrdinalEnum};
pub use errors::{CodecError, CodecErrorCode, CodecResult, Severity};
pub use io::{DataInputExt, DataOutputExt, DecodeLimits, DEFAULT_MAX_STRING_BYTES};
pub use snapshot::{
    resolve_identity, resolve_member_tables, CodecSnapshot, Compatibility, RestoreFn,
};

use std::io::{Read, Write};

/// Binary codec for one value type.
///
/// Implementations are shared read-only across threads; all mutable state of
/// a call lives on the caller's stack or in the stream it passes in.
pub trait TypeCodec: Sized + Send + Sync + 'static {
    /// Value type produced by `decode`
    type Value;

    /// Identity recorded in descriptors
    const CODEC_ID: &'static str;
    /// Value type name recorded in descriptors
    const VALUE_TYPE: &'static str;
    /// Descriptor format version
    const SNAPSHOT_VERSION: u32 = 1;

    /// Whether values can be shared instead of copied
    fn is_immutable_type(&self) -> bool;

    /// Encoded size when constant, `None` for variable-length values
    fn fixed_length(&self) -> Option<usize> {
        None
    }

    /// Canonical placeholder value; its fields carry no meaning
    fn create_instance(&self) -> Self::Value;

    /// Copy sharing no mutable state with `value`
    fn deep_copy(&self, value: &Self::Value) -> Self::Value;

    /// Write `value` to the sink
    fn encode<W: Write + ?Sized>(&self, value: &Self::Value, out: &mut W) -> CodecResult<()>;

    /// Read one value from the source
    fn decode<R: Read + ?Sized>(&self, input: &mut R) -> CodecResult<Self::Value>;

    /// Move one value from `input` to `out`.
    ///
    /// Decodes and re-encodes rather than copying bytes, so the source is
    /// validated on the way through.
    fn transcode<R: Read + ?Sized, W: Write + ?Sized>(
        &self,
        input: &mut R,
        out: &mut W,
    ) -> CodecResult<()> {
        let value = self.decode(input)?;
        self.encode(&value, out)
    }

    /// Parameters recorded in the descriptor
    fn snapshot_params(&self) -> Vec<String> {
        Vec::new()
    }

    /// Rebuild a codec from descriptor parameters
    fn restore(params: &[String]) -> CodecResult<Self>;

    /// Descriptor for this codec's current configuration
    fn snapshot(&self) -> CodecSnapshot<Self> {
        CodecSnapshot::new(self.snapshot_params(), Self::restore)
    }

    /// Classify state written under `previous` for reading with this codec
    fn resolve_compatibility(&self, previous: &CodecSnapshot<Self>) -> Compatibility<Self> {
        resolve_identity(previous, &self.snapshot())
    }
}
