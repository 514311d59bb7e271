//! Plain-data argument values for the reconstruction protocol.
//!
//! Decomposed field and manager recipes carry their constructor arguments
//! as [`Value`] trees. Values are self-contained data: they never hold
//! references to live types, which is what keeps decomposed parts portable
//! across registries and clones.

use indexmap::IndexMap;

/// A constructor argument in a decomposed recipe.
///
/// Equality is total: floats compare by bit pattern, so `NAN == NAN` and
/// `0.0 != -0.0`. That makes equality usable for description comparison,
/// where "would rebuild identically" is the question being asked.
#[derive(Clone, Debug)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating-point number, bitwise-compared.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Ordered sequence of values.
    List(Vec<Value>),
    /// String-keyed mapping, iteration in insertion order.
    Map(IndexMap<String, Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}
