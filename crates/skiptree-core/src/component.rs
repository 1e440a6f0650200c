//! `Component` — a single `(Dimension, value-or-range)` entry of a
//! [`crate::SpacePart`].

use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;
use crate::range::Range;
use crate::value::Value;

/// Either a single point or a range along one dimension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentValue {
    Point(Value),
    Range(Range<Value>),
}

impl ComponentValue {
    /// View this value as a `Range`, widening a point to its degenerate
    /// closed range `[v, v]`.
    #[must_use]
    pub fn as_range(&self) -> Range<Value> {
        match self {
            Self::Point(v) => Range::point(v.clone()),
            Self::Range(r) => r.clone(),
        }
    }

    #[must_use]
    pub fn is_range(&self) -> bool {
        match self {
            Self::Point(_) => false,
            Self::Range(r) => !r.is_degenerate(),
        }
    }
}

/// A `(Dimension, value-or-range)` pair. `is_virtual` marks a component
/// synthesised during routing for a dimension the original key lacked
/// (§4.6 insertion routing, §4.2 forking classification).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub dimension: Dimension,
    pub value: ComponentValue,
    pub is_virtual: bool,
}

impl Component {
    #[must_use]
    pub fn point(dimension: Dimension, value: Value) -> Self {
        Self {
            dimension,
            value: ComponentValue::Point(value),
            is_virtual: false,
        }
    }

    #[must_use]
    pub fn range(dimension: Dimension, range: Range<Value>) -> Self {
        Self {
            dimension,
            value: ComponentValue::Range(range),
            is_virtual: false,
        }
    }

    #[must_use]
    pub fn virtual_range(dimension: Dimension, range: Range<Value>) -> Self {
        Self {
            dimension,
            value: ComponentValue::Range(range),
            is_virtual: true,
        }
    }

    #[must_use]
    pub fn is_range(&self) -> bool {
        self.value.is_range()
    }
}
