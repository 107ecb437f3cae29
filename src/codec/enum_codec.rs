//! Ordinal codec for closed enumerations
//!
//! A member is written as its position in the codec's member table (i32 BE).
//! The default table is the enum's declaration order. Appending members keeps
//! old ordinals valid; reordering does not, and is detected through the
//! descriptor, which records the member names in table order.

use std::borrow::Cow;
use std::fmt;
use std::io::{Read, Write};

use super::errors::{CodecError, CodecResult};
use super::io::{DataInputExt, DataOutputExt};
use super::snapshot::{CodecSnapshot, Compatibility};
use super::TypeCodec;

/// A closed enumeration with stable, named members
pub trait OrdinalEnum: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Name recorded in descriptors
    const TYPE_NAME: &'static str;
    /// All members in declaration order
    const MEMBERS: &'static [Self];

    /// Stable member name
    fn name(self) -> &'static str;

    /// Look up a member by its stable name
    fn from_name(name: &str) -> Option<Self> {
        Self::MEMBERS.iter().copied().find(|m| m.name() == name)
    }
}

/// Codec writing enum members as ordinals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCodec<E: OrdinalEnum> {
    members: Cow<'static, [E]>,
}

impl<E: OrdinalEnum> EnumCodec<E> {
    /// Codec over the enum's declaration order
    pub const fn new() -> Self {
        Self {
            members: Cow::Borrowed(E::MEMBERS),
        }
    }

    /// Codec over an explicit member table, as written by an older codec
    pub fn with_members(members: Vec<E>) -> CodecResult<Self> {
        for (i, member) in members.iter().enumerate() {
            if members[..i].contains(member) {
                return Err(CodecError::malformed(format!(
                    "Duplicate {} member in table: {}",
                    E::TYPE_NAME,
                    member.name()
                )));
            }
        }
        Ok(Self {
            members: Cow::Owned(members),
        })
    }

    /// Member table in wire order
    pub fn members(&self) -> &[E] {
        &self.members
    }

    /// Ordinal written for `value`
    pub fn ordinal_of(&self, value: E) -> CodecResult<i32> {
        self.members
            .iter()
            .position(|m| *m == value)
            .map(|pos| pos as i32)
            .ok_or_else(|| CodecError::illegal_variant(E::TYPE_NAME, value))
    }

    /// Member for a decoded ordinal
    pub fn member_at(&self, ordinal: i32) -> CodecResult<E> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|idx| self.members.get(idx).copied())
            .ok_or_else(|| CodecError::unknown_variant(E::TYPE_NAME, ordinal, self.members.len()))
    }

    /// Descriptor parameter recording this table inside a composite codec,
    /// e.g. `ColumnPosition(FIRST,LAST,BEFORE,AFTER)`
    pub fn table_param(&self) -> String {
        let names: Vec<&str> = self.members.iter().map(|m| m.name()).collect();
        format!("{}({})", E::TYPE_NAME, names.join(","))
    }

    /// Rebuild the table for `E` from a composite codec's descriptor parameters
    pub fn from_table_params(params: &[String]) -> CodecResult<Self> {
        let names = params
            .iter()
            .filter_map(|p| parse_table_param(p))
            .find(|(type_name, _)| *type_name == E::TYPE_NAME)
            .map(|(_, names)| names)
            .ok_or_else(|| {
                CodecError::malformed(format!("Descriptor records no {} table", E::TYPE_NAME))
            })?;
        <Self as TypeCodec>::restore(&names)
    }
}

/// Split a `TypeName(A,B,C)` table parameter into its type name and member names
pub fn parse_table_param(param: &str) -> Option<(&str, Vec<String>)> {
    let (type_name, rest) = param.split_once('(')?;
    let body = rest.strip_suffix(')')?;
    let names = if body.is_empty() {
        Vec::new()
    } else {
        body.split(',').map(str::to_string).collect()
    };
    Some((type_name, names))
}

impl<E: OrdinalEnum> Default for EnumCodec<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: OrdinalEnum> TypeCodec for EnumCodec<E> {
    type Value = E;

    const CODEC_ID: &'static str = "enum";
    const VALUE_TYPE: &'static str = E::TYPE_NAME;

    fn is_immutable_type(&self) -> bool {
        true
    }

    fn fixed_length(&self) -> Option<usize> {
        Some(4)
    }

    fn create_instance(&self) -> E {
        self.members.first().copied().unwrap_or_else(|| E::MEMBERS[0])
    }

    fn deep_copy(&self, value: &E) -> E {
        *value
    }

    fn encode<W: Write + ?Sized>(&self, value: &E, out: &mut W) -> CodecResult<()> {
        let ordinal = self.ordinal_of(*value)?;
        out.write_i32_be(ordinal)
    }

    fn decode<R: Read + ?Sized>(&self, input: &mut R) -> CodecResult<E> {
        let ordinal = input.read_i32_be()?;
        self.member_at(ordinal)
    }

    fn snapshot_params(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name().to_string()).collect()
    }

    fn restore(params: &[String]) -> CodecResult<Self> {
        let members = params
            .iter()
            .map(|name| {
                E::from_name(name).ok_or_else(|| {
                    CodecError::malformed(format!("Unknown {} member: {}", E::TYPE_NAME, name))
                })
            })
            .collect::<CodecResult<Vec<E>>>()?;
        Self::with_members(members)
    }

    fn resolve_compatibility(&self, previous: &CodecSnapshot<Self>) -> Compatibility<Self> {
        let current = self.snapshot();
        if !previous.same_identity(&current) {
            return Compatibility::Incompatible {
                reason: format!("codec changed from {} to {}", previous, current),
            };
        }

        if let Some(removed) = previous.params().iter().find(|n| E::from_name(n).is_none()) {
            return Compatibility::Incompatible {
                reason: format!("{} member {} no longer exists", E::TYPE_NAME, removed),
            };
        }

        let current_names = current.params();
        let is_prefix = previous.params().len() <= current_names.len()
            && previous
                .params()
                .iter()
                .zip(current_names)
                .all(|(old, new)| old == new);
        if is_prefix {
            return Compatibility::CompatibleAsIs;
        }

        match previous.restore_codec() {
            Ok(codec) => Compatibility::RequiresMigration { previous: codec },
            Err(e) => Compatibility::Incompatible {
                reason: e.to_string(),
            },
        }
    }
}
