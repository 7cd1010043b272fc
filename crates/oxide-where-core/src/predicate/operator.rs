//! Comparison operators and their string tags.

use std::fmt;
use std::str::FromStr;

use crate::error::WhereError;

/// A named comparison applied between a field value and an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal (`eq`)
    Eq,
    /// Not equal (`ne`)
    Ne,
    /// Less than (`lt`)
    Lt,
    /// Less than or equal (`lte`)
    Lte,
    /// Greater than (`gt`)
    Gt,
    /// Greater than or equal (`gte`)
    Gte,
    /// SQL pattern match (`like`)
    Like,
    /// Negated pattern match (`notLike`)
    NotLike,
    /// Case-insensitive pattern match (`iLike`)
    ILike,
    /// Negated case-insensitive pattern match (`notILike`)
    NotILike,
    /// Literal prefix match (`startsWith`)
    StartsWith,
    /// Literal suffix match (`endsWith`)
    EndsWith,
    /// Literal infix match (`substring`)
    Substring,
    /// List membership (`in`)
    In,
    /// Negated list membership (`notIn`)
    NotIn,
    /// Inclusive range (`between`)
    Between,
    /// Negated inclusive range (`notBetween`)
    NotBetween,
    /// NULL check (`isNull`)
    IsNull,
    /// NOT NULL check (`notNull`)
    NotNull,
}

/// The operand shape an operator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    /// No operand; anything given is ignored.
    None,
    /// A single scalar.
    Single,
    /// A list of scalars.
    List,
    /// A text pattern.
    Pattern,
}

impl Operator {
    /// All recognized operators.
    pub const ALL: [Self; 19] = [
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Lte,
        Self::Gt,
        Self::Gte,
        Self::Like,
        Self::NotLike,
        Self::ILike,
        Self::NotILike,
        Self::StartsWith,
        Self::EndsWith,
        Self::Substring,
        Self::In,
        Self::NotIn,
        Self::Between,
        Self::NotBetween,
        Self::IsNull,
        Self::NotNull,
    ];

    /// Returns the operator's tag, as used in where-objects.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Like => "like",
            Self::NotLike => "notLike",
            Self::ILike => "iLike",
            Self::NotILike => "notILike",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Substring => "substring",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::Between => "between",
            Self::NotBetween => "notBetween",
            Self::IsNull => "isNull",
            Self::NotNull => "notNull",
        }
    }

    /// Returns the SQL spelling of the operator.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Like | Self::StartsWith | Self::EndsWith | Self::Substring => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::ILike => "ILIKE",
            Self::NotILike => "NOT ILIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
            Self::IsNull => "IS NULL",
            Self::NotNull => "IS NOT NULL",
        }
    }

    /// Returns the operand shape this operator expects.
    #[must_use]
    pub const fn operand_shape(self) -> OperandShape {
        match self {
            Self::Eq | Self::Ne | Self::Lt | Self::Lte | Self::Gt | Self::Gte => {
                OperandShape::Single
            }
            Self::Like
            | Self::NotLike
            | Self::ILike
            | Self::NotILike
            | Self::StartsWith
            | Self::EndsWith
            | Self::Substring => OperandShape::Pattern,
            Self::In | Self::NotIn | Self::Between | Self::NotBetween => OperandShape::List,
            Self::IsNull | Self::NotNull => OperandShape::None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Operator {
    type Err = WhereError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.tag() == s)
            .ok_or_else(|| WhereError::UnknownOperator(s.to_string()))
    }
}
