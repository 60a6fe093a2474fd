//! Query and changeset triples
//!
//! Conditions and changesets normalize to ordered (path, operator, operand)
//! triples. Triple order follows the input field order and is not sorted.

use serde_json::Value;

/// Comparison operators usable in query conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOp {
    /// Equality
    Eq,
    /// Inequality
    Ne,
    /// Strictly less than
    Lt,
    /// Strictly greater than
    Gt,
    /// Less than or equal
    Le,
    /// Greater than or equal
    Ge,
    /// Membership of the operand list
    In,
    /// Non-membership of the operand list
    Nin,
    /// Text pattern match over string values
    Match,
    /// Membership test over list values
    Contains,
}

impl QueryOp {
    /// Parses an operator name (`$eq`, `$in`, ...)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "$eq" => Some(Self::Eq),
            "$ne" => Some(Self::Ne),
            "$lt" => Some(Self::Lt),
            "$gt" => Some(Self::Gt),
            "$le" => Some(Self::Le),
            "$ge" => Some(Self::Ge),
            "$in" => Some(Self::In),
            "$nin" => Some(Self::Nin),
            "$match" => Some(Self::Match),
            "$contains" => Some(Self::Contains),
            _ => None,
        }
    }

    /// Operator name as written in conditions
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Lt => "$lt",
            Self::Gt => "$gt",
            Self::Le => "$le",
            Self::Ge => "$ge",
            Self::In => "$in",
            Self::Nin => "$nin",
            Self::Match => "$match",
            Self::Contains => "$contains",
        }
    }

    /// Whether this operator can be answered from an index bucket lookup
    pub fn index_eligible(&self) -> bool {
        matches!(self, Self::Eq | Self::In | Self::Contains)
    }
}

/// Mutation operators usable in changesets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    /// Replace the value
    Set,
    /// Add the operand to a numeric value (missing base is 0)
    Inc,
    /// Subtract the operand from a numeric value (missing base is 0)
    Dec,
    /// Append to a list, creating it when absent
    Push,
    /// Append an operand list to a list
    Concat,
    /// Append only when the value is not already present
    SetAdd,
    /// Drop elements from the tail (n > 0) or head (n < 0)
    Pop,
    /// Remove every occurrence of the operand value(s)
    Pull,
}

impl ChangeOp {
    /// Parses an operator name (`$set`, `$push`, ...)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "$set" => Some(Self::Set),
            "$inc" => Some(Self::Inc),
            "$dec" => Some(Self::Dec),
            "$push" => Some(Self::Push),
            "$concat" => Some(Self::Concat),
            "$setadd" => Some(Self::SetAdd),
            "$pop" => Some(Self::Pop),
            "$pull" => Some(Self::Pull),
            _ => None,
        }
    }

    /// Operator name as written in changesets
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "$set",
            Self::Inc => "$inc",
            Self::Dec => "$dec",
            Self::Push => "$push",
            Self::Concat => "$concat",
            Self::SetAdd => "$setadd",
            Self::Pop => "$pop",
            Self::Pull => "$pull",
        }
    }
}

/// One normalized query condition
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTriple {
    /// Property path the condition applies to
    pub path: String,
    /// Comparison operator
    pub op: QueryOp,
    /// Operand value
    pub operand: Value,
}

impl QueryTriple {
    /// Creates a triple
    pub fn new(path: impl Into<String>, op: QueryOp, operand: Value) -> Self {
        Self {
            path: path.into(),
            op,
            operand,
        }
    }
}

/// One normalized changeset entry
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeTriple {
    /// Property path the mutation applies to
    pub path: String,
    /// Mutation operator
    pub op: ChangeOp,
    /// Operand value
    pub operand: Value,
}

impl ChangeTriple {
    /// Creates a triple
    pub fn new(path: impl Into<String>, op: ChangeOp, operand: Value) -> Self {
        Self {
            path: path.into(),
            op,
            operand,
        }
    }
}
