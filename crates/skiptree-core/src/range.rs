//! `Range<T>` — a possibly half-open, possibly unbounded interval over a
//! totally ordered `T`.

use serde::{Deserialize, Serialize};

use crate::identifiers::Direction;

/// A possibly half-open interval over a totally ordered `T`.
///
/// `None` endpoints are unbounded. `min_included`/`max_included` are
/// ignored when the corresponding endpoint is `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub min_included: bool,
    pub max_included: bool,
}

impl<T: Ord + Clone> Range<T> {
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            min: None,
            max: None,
            min_included: true,
            max_included: true,
        }
    }

    /// A single point, as a degenerate closed range `[v, v]`.
    #[must_use]
    pub fn point(v: T) -> Self {
        Self {
            min: Some(v.clone()),
            max: Some(v),
            min_included: true,
            max_included: true,
        }
    }

    #[must_use]
    pub fn closed(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            min_included: true,
            max_included: true,
        }
    }

    /// Whether this range is exactly one value (used to distinguish a point
    /// `Component` from a true range).
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        matches!((&self.min, &self.max), (Some(a), Some(b)) if a == b)
    }

    #[must_use]
    pub fn includes_value(&self, v: &T) -> bool {
        let lo_ok = match &self.min {
            None => true,
            Some(lo) => {
                if self.min_included {
                    lo <= v
                } else {
                    lo < v
                }
            }
        };
        let hi_ok = match &self.max {
            None => true,
            Some(hi) => {
                if self.max_included {
                    v <= hi
                } else {
                    v < hi
                }
            }
        };
        lo_ok && hi_ok
    }

    /// Whether this range contains any point strictly before `pivot`.
    #[must_use]
    pub fn any_point_before(&self, pivot: &T) -> bool {
        match &self.min {
            None => true,
            Some(lo) => lo < pivot,
        }
    }

    /// Whether this range contains any point strictly after `pivot`.
    #[must_use]
    pub fn any_point_after(&self, pivot: &T) -> bool {
        match &self.max {
            None => true,
            Some(hi) => hi > pivot,
        }
    }

    /// Returns a new, tighter range: `restrict(Left, v)` keeps only the
    /// part at or below `v` (clamping `max`); `restrict(Right, v)` keeps
    /// only the part at or above `v` (clamping `min`). Used both by CPE
    /// `get_range` accumulation and by `PidRange` narrowing during by-CPE
    /// routing.
    #[must_use]
    pub fn restrict(&self, direction: Direction, v: T) -> Self {
        let mut out = self.clone();
        match direction {
            Direction::Left => {
                if out.max.as_ref().is_none_or(|hi| &v < hi) {
                    out.max = Some(v);
                    out.max_included = true;
                }
            }
            Direction::Right => {
                if out.min.as_ref().is_none_or(|lo| &v > lo) {
                    out.min = Some(v);
                    out.min_included = true;
                }
            }
        }
        out
    }

    /// Widen a point range to an unbounded degenerate range marker used by
    /// `SpacePart::val2range`: kept as-is since a `Range` already models
    /// both points and true ranges uniformly.
    #[must_use]
    pub fn widen_to_range(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_range_includes_only_itself() {
        let r = Range::point(5i64);
        assert!(r.includes_value(&5));
        assert!(!r.includes_value(&4));
        assert!(r.is_degenerate());
    }

    #[test]
    fn half_open_bounds_respect_inclusion_flags() {
        let mut r = Range::closed(0i64, 10);
        r.max_included = false;
        assert!(r.includes_value(&9));
        assert!(!r.includes_value(&10));
    }

    #[test]
    fn restrict_narrows_without_widening() {
        let r = Range::closed(0i64, 10);
        let narrowed = r.restrict(Direction::Left, 5);
        assert_eq!(narrowed.max, Some(5));
        // restrict(Left, 20) must not widen past the existing max.
        let unchanged = r.restrict(Direction::Left, 20);
        assert_eq!(unchanged.max, Some(10));
    }

    #[test]
    fn any_point_before_after_unbounded() {
        let r: Range<i64> = Range::unbounded();
        assert!(r.any_point_before(&0));
        assert!(r.any_point_after(&0));
    }
}
