//! `Value` — the scalar type carried by a [`crate::Component`] or
//! [`crate::Range`].
//!
//! The source system's dimensions are dynamically typed (a Python value);
//! here that becomes a small closed sum type with a total order so ranges,
//! pivots, and CPE comparisons all have one concrete `Ord` to work against.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single coordinate value along some [`crate::Dimension`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    /// Stored as bits so `Value` can derive `Eq`/`Hash`/`Ord`; compared via
    /// `f64::total_cmp`.
    Float(f64),
    Text(String),
}

impl Value {
    #[must_use]
    pub fn int(v: i64) -> Self {
        Self::Int(v)
    }

    #[must_use]
    pub fn float(v: f64) -> Self {
        Self::Float(v)
    }

    #[must_use]
    pub fn text(v: impl Into<String>) -> Self {
        Self::Text(v.into())
    }

    /// A numeric view, for pivot arithmetic; `Text` values have no numeric
    /// reading and return `None`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::Float(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            // Cross-variant comparisons are rare (a dimension is normally
            // fed one kind of value) but must still total-order so ranges
            // stay well-defined; fall back to numeric value then rank.
            (Self::Int(a), Self::Float(b)) => (*a as f64).total_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.total_cmp(&(*b as f64)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
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
        Self::Text(v.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_and_floats_compare_numerically() {
        assert!(Value::int(4) < Value::float(4.5));
        assert!(Value::float(3.9) < Value::int(4));
    }

    #[test]
    fn total_order_is_reflexive_and_transitive_on_samples() {
        let mut vs = vec![Value::int(3), Value::float(1.5), Value::text("m"), Value::int(-2)];
        vs.sort();
        assert_eq!(vs[0], Value::int(-2));
    }
}
