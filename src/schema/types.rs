//! Column data types
//!
//! Minimal type model carried by columns. The codec treats it as an opaque
//! payload; only the root, nullability and the root's integer parameters are
//! recorded.
//!
//! Supported roots:
//! - BOOLEAN, TINYINT, SMALLINT, INT, BIGINT, FLOAT, DOUBLE
//! - DECIMAL(precision, scale)
//! - CHAR(length), VARCHAR(length), BINARY(length), VARBINARY(length)
//! - DATE, TIME(precision), TIMESTAMP(precision)

use std::fmt;

use crate::codec::OrdinalEnum;

/// Type root, written as an ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRoot {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Char,
    VarChar,
    Binary,
    VarBinary,
    Date,
    Time,
    Timestamp,
}

impl TypeRoot {
    /// Number of integer parameters the root carries
    pub fn parameter_count(self) -> usize {
        match self {
            TypeRoot::Decimal => 2,
            TypeRoot::Char
            | TypeRoot::VarChar
            | TypeRoot::Binary
            | TypeRoot::VarBinary
            | TypeRoot::Time
            | TypeRoot::Timestamp => 1,
            _ => 0,
        }
    }
}

impl OrdinalEnum for TypeRoot {
    const TYPE_NAME: &'static str = "TypeRoot";
    const MEMBERS: &'static [Self] = &[
        TypeRoot::Boolean,
        TypeRoot::TinyInt,
        TypeRoot::SmallInt,
        TypeRoot::Int,
        TypeRoot::BigInt,
        TypeRoot::Float,
        TypeRoot::Double,
        TypeRoot::Decimal,
        TypeRoot::Char,
        TypeRoot::VarChar,
        TypeRoot::Binary,
        TypeRoot::VarBinary,
        TypeRoot::Date,
        TypeRoot::Time,
        TypeRoot::Timestamp,
    ];

    fn name(self) -> &'static str {
        match self {
            TypeRoot::Boolean => "BOOLEAN",
            TypeRoot::TinyInt => "TINYINT",
            TypeRoot::SmallInt => "SMALLINT",
            TypeRoot::Int => "INT",
            TypeRoot::BigInt => "BIGINT",
            TypeRoot::Float => "FLOAT",
            TypeRoot::Double => "DOUBLE",
            TypeRoot::Decimal => "DECIMAL",
            TypeRoot::Char => "CHAR",
            TypeRoot::VarChar => "VARCHAR",
            TypeRoot::Binary => "BINARY",
            TypeRoot::VarBinary => "VARBINARY",
            TypeRoot::Date => "DATE",
            TypeRoot::Time => "TIME",
            TypeRoot::Timestamp => "TIMESTAMP",
        }
    }
}

/// Column data type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataType {
    root: TypeRoot,
    nullable: bool,
    parameters: Vec<i32>,
}

impl DataType {
    /// Build a type from its parts.
    ///
    /// Returns `None` when the parameter count does not match the root.
    pub fn from_parts(root: TypeRoot, nullable: bool, parameters: Vec<i32>) -> Option<Self> {
        if parameters.len() != root.parameter_count() {
            return None;
        }
        Some(Self {
            root,
            nullable,
            parameters,
        })
    }

    fn simple(root: TypeRoot) -> Self {
        Self {
            root,
            nullable: true,
            parameters: Vec::new(),
        }
    }

    fn with_params(root: TypeRoot, parameters: Vec<i32>) -> Self {
        Self {
            root,
            nullable: true,
            parameters,
        }
    }

    /// Nullable BOOLEAN
    pub fn boolean() -> Self {
        Self::simple(TypeRoot::Boolean)
    }

    /// Nullable TINYINT
    pub fn tinyint() -> Self {
        Self::simple(TypeRoot::TinyInt)
    }

    /// Nullable SMALLINT
    pub fn smallint() -> Self {
        Self::simple(TypeRoot::SmallInt)
    }

    /// Nullable INT
    pub fn int() -> Self {
        Self::simple(TypeRoot::Int)
    }

    /// Nullable BIGINT
    pub fn bigint() -> Self {
        Self::simple(TypeRoot::BigInt)
    }

    /// Nullable FLOAT
    pub fn float() -> Self {
        Self::simple(TypeRoot::Float)
    }

    /// Nullable DOUBLE
    pub fn double() -> Self {
        Self::simple(TypeRoot::Double)
    }

    /// Nullable DECIMAL(precision, scale)
    pub fn decimal(precision: i32, scale: i32) -> Self {
        Self::with_params(TypeRoot::Decimal, vec![precision, scale])
    }

    /// Nullable fixed-length CHAR(length)
    pub fn char(length: i32) -> Self {
        Self::with_params(TypeRoot::Char, vec![length])
    }

    /// Nullable VARCHAR with a maximum length
    pub fn varchar(length: i32) -> Self {
        Self::with_params(TypeRoot::VarChar, vec![length])
    }

    /// Unbounded character string
    pub fn string() -> Self {
        Self::varchar(i32::MAX)
    }

    /// Nullable fixed-length BINARY(length)
    pub fn binary(length: i32) -> Self {
        Self::with_params(TypeRoot::Binary, vec![length])
    }

    /// Nullable VARBINARY with a maximum length
    pub fn varbinary(length: i32) -> Self {
        Self::with_params(TypeRoot::VarBinary, vec![length])
    }

    /// Nullable DATE
    pub fn date() -> Self {
        Self::simple(TypeRoot::Date)
    }

    /// Nullable TIME with fractional-second precision
    pub fn time(precision: i32) -> Self {
        Self::with_params(TypeRoot::Time, vec![precision])
    }

    /// Nullable TIMESTAMP with fractional-second precision
    pub fn timestamp(precision: i32) -> Self {
        Self::with_params(TypeRoot::Timestamp, vec![precision])
    }

    /// Same type with NOT NULL
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Same type allowing NULL
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Type family
    pub fn root(&self) -> TypeRoot {
        self.root
    }

    /// Returns true unless the type is NOT NULL
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Length, precision or scale parameters, in declaration order
    pub fn parameters(&self) -> &[i32] {
        &self.parameters
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.root == TypeRoot::VarChar && self.parameters == [i32::MAX] {
            write!(f, "STRING")?;
        } else {
            write!(f, "{}", self.root.name())?;
            if !self.parameters.is_empty() {
                let params: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();
                write!(f, "({})", params.join(", "))?;
            }
        }
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_checks_parameter_count() {
        assert!(DataType::from_parts(TypeRoot::Decimal, true, vec![10, 2]).is_some());
        assert!(DataType::from_parts(TypeRoot::Decimal, true, vec![10]).is_none());
        assert!(DataType::from_parts(TypeRoot::Int, false, vec![1]).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::bigint().to_string(), "BIGINT");
        assert_eq!(DataType::decimal(10, 2).not_null().to_string(), "DECIMAL(10, 2) NOT NULL");
        assert_eq!(DataType::string().to_string(), "STRING");
    }

    #[test]
    fn test_member_names_round_trip() {
        for root in TypeRoot::MEMBERS {
            assert_eq!(TypeRoot::from_name(root.name()), Some(*root));
        }
    }
}
