//! Column insertion positions for add-column schema changes

use std::fmt;

use super::column::Column;
use crate::codec::OrdinalEnum;

/// Where an added column goes relative to existing columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnPosition {
    First,
    Last,
    Before,
    After,
}

impl ColumnPosition {
    /// Whether this position is relative to an anchor column
    pub fn requires_anchor(self) -> bool {
        matches!(self, ColumnPosition::Before | ColumnPosition::After)
    }
}

impl OrdinalEnum for ColumnPosition {
    const TYPE_NAME: &'static str = "ColumnPosition";
    const MEMBERS: &'static [Self] = &[
        ColumnPosition::First,
        ColumnPosition::Last,
        ColumnPosition::Before,
        ColumnPosition::After,
    ];

    fn name(self) -> &'static str {
        match self {
            ColumnPosition::First => "FIRST",
            ColumnPosition::Last => "LAST",
            ColumnPosition::Before => "BEFORE",
            ColumnPosition::After => "AFTER",
        }
    }
}

impl fmt::Display for ColumnPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A column to add, with its insertion position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnWithPosition {
    pub add_column: Column,
    pub position: ColumnPosition,
    /// Anchor for BEFORE / AFTER
    pub existing_column: Option<Column>,
}

impl ColumnWithPosition {
    /// Append `add_column` as the last column
    pub fn new(add_column: Column) -> Self {
        Self::last(add_column)
    }

    pub fn with_position(
        add_column: Column,
        position: ColumnPosition,
        existing_column: Option<Column>,
    ) -> Self {
        Self {
            add_column,
            position,
            existing_column,
        }
    }

    pub fn first(add_column: Column) -> Self {
        Self::with_position(add_column, ColumnPosition::First, None)
    }

    pub fn last(add_column: Column) -> Self {
        Self::with_position(add_column, ColumnPosition::Last, None)
    }

    pub fn before(add_column: Column, existing_column: Column) -> Self {
        Self::with_position(add_column, ColumnPosition::Before, Some(existing_column))
    }

    pub fn after(add_column: Column, existing_column: Column) -> Self {
        Self::with_position(add_column, ColumnPosition::After, Some(existing_column))
    }

    /// True when an anchor is present exactly for BEFORE / AFTER
    pub fn is_anchor_consistent(&self) -> bool {
        self.position.requires_anchor() == self.existing_column.is_some()
    }
}
