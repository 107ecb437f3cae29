//! Column variants
//!
//! A column is exactly one of a closed set of kinds. Adding a kind means a new
//! `Column` variant, a new `ColumnKind` member and a new variant codec; every
//! dispatch point is an exhaustive match, so the compiler lists what is left.

use std::fmt;

use super::types::DataType;
use crate::codec::OrdinalEnum;

/// Column backed by a physical table field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhysicalColumn {
    pub name: String,
    pub data_type: DataType,
    pub comment: Option<String>,
}

impl PhysicalColumn {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            comment: None,
        }
    }
}

/// Column whose value comes from source metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataColumn {
    pub name: String,
    pub data_type: DataType,
    /// Metadata key the value is read from; defaults to the column name
    pub metadata_key: Option<String>,
    pub comment: Option<String>,
}

impl MetadataColumn {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            metadata_key: None,
            comment: None,
        }
    }
}

/// Wire discriminator of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Physical,
    Metadata,
}

impl OrdinalEnum for ColumnKind {
    const TYPE_NAME: &'static str = "ColumnKind";
    const MEMBERS: &'static [Self] = &[ColumnKind::Physical, ColumnKind::Metadata];

    fn name(self) -> &'static str {
        match self {
            ColumnKind::Physical => "PHYSICAL",
            ColumnKind::Metadata => "METADATA",
        }
    }
}

/// A table column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    Physical(PhysicalColumn),
    Metadata(MetadataColumn),
}

impl Column {
    /// Physical column without a comment
    pub fn physical_column(name: impl Into<String>, data_type: DataType) -> Self {
        Column::Physical(PhysicalColumn::new(name, data_type))
    }

    /// Physical column with a comment
    pub fn physical_column_with_comment(
        name: impl Into<String>,
        data_type: DataType,
        comment: impl Into<String>,
    ) -> Self {
        Column::Physical(PhysicalColumn {
            comment: Some(comment.into()),
            ..PhysicalColumn::new(name, data_type)
        })
    }

    /// Metadata column keyed by its own name
    pub fn metadata_column(name: impl Into<String>, data_type: DataType) -> Self {
        Column::Metadata(MetadataColumn::new(name, data_type))
    }

    /// Metadata column reading an explicit metadata key
    pub fn metadata_column_with_key(
        name: impl Into<String>,
        data_type: DataType,
        metadata_key: impl Into<String>,
    ) -> Self {
        Column::Metadata(MetadataColumn {
            metadata_key: Some(metadata_key.into()),
            ..MetadataColumn::new(name, data_type)
        })
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Physical(_) => ColumnKind::Physical,
            Column::Metadata(_) => ColumnKind::Metadata,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Column::Physical(c) => &c.name,
            Column::Metadata(c) => &c.name,
        }
    }

    pub fn data_type(&self) -> &DataType {
        match self {
            Column::Physical(c) => &c.data_type,
            Column::Metadata(c) => &c.data_type,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Column::Physical(c) => c.comment.as_deref(),
            Column::Metadata(c) => c.comment.as_deref(),
        }
    }

    /// Rename in place
    pub fn set_name(&mut self, name: impl Into<String>) {
        match self {
            Column::Physical(c) => c.name = name.into(),
            Column::Metadata(c) => c.name = name.into(),
        }
    }

    /// Replace the comment in place
    pub fn set_comment(&mut self, comment: Option<String>) {
        match self {
            Column::Physical(c) => c.comment = comment,
            Column::Metadata(c) => c.comment = comment,
        }
    }

    pub fn as_physical(&self) -> Option<&PhysicalColumn> {
        match self {
            Column::Physical(c) => Some(c),
            Column::Metadata(_) => None,
        }
    }

    pub fn as_metadata(&self) -> Option<&MetadataColumn> {
        match self {
            Column::Metadata(c) => Some(c),
            Column::Physical(_) => None,
        }
    }
}

impl From<PhysicalColumn> for Column {
    fn from(column: PhysicalColumn) -> Self {
        Column::Physical(column)
    }
}

impl From<MetadataColumn> for Column {
    fn from(column: MetadataColumn) -> Self {
        Column::Metadata(column)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.name(), self.data_type())?;
        if let Column::Metadata(c) = self {
            write!(f, " METADATA")?;
            if let Some(ref key) = c.metadata_key {
                write!(f, " FROM '{}'", key)?;
            }
        }
        if let Some(comment) = self.comment() {
            write!(f, " '{}'", comment)?;
        }
        Ok(())
    }
}
