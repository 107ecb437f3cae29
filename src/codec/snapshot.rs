//! Codec compatibility descriptors
//!
//! A `CodecSnapshot` fingerprints a codec's wire format: which codec wrote the
//! bytes, what value type it reconstructs, the descriptor version and any
//! parameterization (such as an enum's member order). It is persisted alongside
//! encoded state and compared with the running codec before that state is
//! trusted.
//!
//! Serialized form:
//! - codec_id (string)
//! - version (i32 BE)
//! - value_type (string)
//! - param_count (i32 BE)
//! - params (strings)

use std::fmt;
use std::io::{Read, Write};

use super::enum_codec::parse_table_param;
use super::errors::{CodecError, CodecResult};
use super::io::{DataInputExt, DataOutputExt, DecodeLimits};
use super::TypeCodec;

/// Upper bound on parameters accepted when reading a descriptor
const MAX_PARAMS: i32 = 4096;

/// Limits for descriptor strings, independent of value decoding limits
const DESCRIPTOR_LIMITS: DecodeLimits = DecodeLimits::new(64 * 1024);

/// Statically known constructor that rebuilds a codec from descriptor params
pub type RestoreFn<C> = fn(&[String]) -> CodecResult<C>;

/// Outcome of comparing a persisted descriptor with the running codec
#[derive(Debug)]
pub enum Compatibility<C> {
    /// The running codec reads the old bytes directly
    CompatibleAsIs,
    /// Old bytes must be read with `previous`, then rewritten with the running codec
    RequiresMigration {
        /// Codec configured exactly as the one that wrote the state
        previous: C,
    },
    /// The state cannot be read safely
    Incompatible {
        /// Why the formats differ
        reason: String,
    },
}

impl<C> Compatibility<C> {
    /// Returns true if the running codec can read the old bytes unchanged
    pub fn is_compatible_as_is(&self) -> bool {
        matches!(self, Compatibility::CompatibleAsIs)
    }

    /// Returns true if a migration path exists
    pub fn requires_migration(&self) -> bool {
        matches!(self, Compatibility::RequiresMigration { .. })
    }

    /// Returns true if the state must be rejected
    pub fn is_incompatible(&self) -> bool {
        matches!(self, Compatibility::Incompatible { .. })
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Compatibility::CompatibleAsIs => "compatible_as_is",
            Compatibility::RequiresMigration { .. } => "requires_migration",
            Compatibility::Incompatible { .. } => "incompatible",
        }
    }
}

/// Serializable fingerprint of a codec configuration
pub struct CodecSnapshot<C> {
    codec_id: String,
    version: u32,
    value_type: String,
    params: Vec<String>,
    restore: RestoreFn<C>,
}

impl<C: TypeCodec> CodecSnapshot<C> {
    /// Create a descriptor for codec type `C`
    pub fn new(params: Vec<String>, restore: RestoreFn<C>) -> Self {
        Self {
            codec_id: C::CODEC_ID.to_string(),
            version: C::SNAPSHOT_VERSION,
            value_type: C::VALUE_TYPE.to_string(),
            params,
            restore,
        }
    }

    /// Write the descriptor to a byte sink
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> CodecResult<()> {
        out.write_string(&self.codec_id)?;
        out.write_i32_be(self.version as i32)?;
        out.write_string(&self.value_type)?;
        out.write_i32_be(self.params.len() as i32)?;
        for param in &self.params {
            out.write_string(param)?;
        }
        Ok(())
    }

    /// Serialize the descriptor to bytes
    pub fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Read a descriptor persisted by some version of codec type `C`.
    ///
    /// The restore constructor is taken from `C` itself; the bytes only carry
    /// identity and parameters.
    pub fn read_from<R: Read + ?Sized>(input: &mut R) -> CodecResult<Self> {
        let codec_id = input.read_string(DESCRIPTOR_LIMITS)?;
        let version = input.read_i32_be()?;
        if version < 0 {
            return Err(CodecError::malformed(format!(
                "Negative descriptor version: {}",
                version
            )));
        }
        let value_type = input.read_string(DESCRIPTOR_LIMITS)?;
        let count = input.read_i32_be()?;
        if !(0..=MAX_PARAMS).contains(&count) {
            return Err(CodecError::malformed(format!(
                "Invalid descriptor parameter count: {}",
                count
            )));
        }
        let mut params = Vec::with_capacity(count as usize);
        for _ in 0..count {
            params.push(input.read_string(DESCRIPTOR_LIMITS)?);
        }
        Ok(Self {
            codec_id,
            version: version as u32,
            value_type,
            params,
            restore: C::restore,
        })
    }

    /// Rebuild the codec that wrote the state
    pub fn restore_codec(&self) -> CodecResult<C> {
        (self.restore)(&self.params)
    }

    /// Compare this (previous) descriptor with the running codec
    pub fn resolve(&self, current: &C) -> Compatibility<C> {
        current.resolve_compatibility(self)
    }

    /// Returns true if codec id, value type and version all match `other`
    pub fn same_identity(&self, other: &CodecSnapshot<C>) -> bool {
        self.codec_id == other.codec_id
            && self.value_type == other.value_type
            && self.version == other.version
    }

    /// Identity of the codec that wrote the state
    pub fn codec_id(&self) -> &str {
        &self.codec_id
    }

    /// Descriptor format version of that codec
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Value type the codec reconstructs
    pub fn value_type(&self) -> &str {
        &self.value_type
    }

    /// Codec parameterization, such as enum member tables
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

/// Identity comparison shared by codecs without an upgrade path
pub fn resolve_identity<C: TypeCodec>(
    previous: &CodecSnapshot<C>,
    current: &CodecSnapshot<C>,
) -> Compatibility<C> {
    if previous.codec_id != current.codec_id || previous.value_type != current.value_type {
        return Compatibility::Incompatible {
            reason: format!("codec changed from {} to {}", previous, current),
        };
    }
    if previous.version != current.version {
        return Compatibility::Incompatible {
            reason: format!(
                "descriptor version {} is not readable by version {}",
                previous.version, current.version
            ),
        };
    }
    if previous.params != current.params {
        return Compatibility::Incompatible {
            reason: format!("codec parameters changed from {} to {}", previous, current),
        };
    }
    Compatibility::CompatibleAsIs
}

/// Resolution for composite codecs whose parameters are nested enum tables.
///
/// Each previous table is matched by type name against the running codec:
/// - a member no longer defined, or a table no longer recorded: `Incompatible`
/// - every table unchanged or only appended to: `CompatibleAsIs`
/// - any table reordered: `RequiresMigration` with the previous tables restored
pub fn resolve_member_tables<C: TypeCodec>(
    previous: &CodecSnapshot<C>,
    current: &C,
) -> Compatibility<C> {
    let current = current.snapshot();
    if !previous.same_identity(&current) {
        return Compatibility::Incompatible {
            reason: format!("codec changed from {} to {}", previous, current),
        };
    }
    if previous.params == current.params {
        return Compatibility::CompatibleAsIs;
    }

    let current_tables: Vec<(&str, Vec<String>)> = current
        .params
        .iter()
        .filter_map(|p| parse_table_param(p))
        .collect();

    let mut reordered = false;
    for param in &previous.params {
        let (type_name, old) = match parse_table_param(param) {
            Some(table) => table,
            None => {
                return Compatibility::Incompatible {
                    reason: format!("unrecognized descriptor parameter {}", param),
                }
            }
        };
        let new = match current_tables.iter().find(|(t, _)| *t == type_name) {
            Some((_, names)) => names,
            None => {
                return Compatibility::Incompatible {
                    reason: format!("{} table is no longer part of {}", type_name, current),
                }
            }
        };
        if let Some(removed) = old.iter().find(|name| !new.contains(name)) {
            return Compatibility::Incompatible {
                reason: format!("{} member {} no longer exists", type_name, removed),
            };
        }
        let appended_only = old.len() <= new.len() && old.iter().zip(new).all(|(a, b)| a == b);
        reordered |= !appended_only;
    }

    if !reordered {
        return Compatibility::CompatibleAsIs;
    }
    match previous.restore_codec() {
        Ok(codec) => Compatibility::RequiresMigration { previous: codec },
        Err(e) => Compatibility::Incompatible {
            reason: e.to_string(),
        },
    }
}

impl<C> Clone for CodecSnapshot<C> {
    fn clone(&self) -> Self {
        Self {
            codec_id: self.codec_id.clone(),
            version: self.version,
            value_type: self.value_type.clone(),
            params: self.params.clone(),
            restore: self.restore,
        }
    }
}

impl<C> PartialEq for CodecSnapshot<C> {
    fn eq(&self, other: &Self) -> bool {
        self.codec_id == other.codec_id
            && self.version == other.version
            && self.value_type == other.value_type
            && self.params == other.params
    }
}

impl<C> fmt::Debug for CodecSnapshot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecSnapshot")
            .field("codec_id", &self.codec_id)
            .field("version", &self.version)
            .field("value_type", &self.value_type)
            .field("params", &self.params)
            .finish()
    }
}

impl<C> fmt::Display for CodecSnapshot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}<{}>", self.codec_id, self.version, self.value_type)?;
        if !self.params.is_empty() {
            write!(f, "[{}]", self.params.join(","))?;
        }
        Ok(())
    }
}
