//! `NameID`, `NumericID`, and `PartitionID` — the three orderings a peer is
//! addressed by (lexicographic, bitwise-prefix, and left-to-right leaf
//! order respectively).

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A side of a split, or a scan direction in a half-ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "LEFT"),
            Self::Right => write!(f, "RIGHT"),
        }
    }
}

/// Lexicographically-ordered peer identifier used by by-name routing.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NameID(String);

impl NameID {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Integer longest-common-prefix length (bytes) plus a fractional
    /// tie-breaker derived from the first differing byte, so two pairs with
    /// the same integer LCP can still be ordered by "closeness". Used by the
    /// skip-tree join to prefer a contact with a larger shared name prefix
    /// (§4.7.1).
    #[must_use]
    pub fn longest_common_prefix_length(&self, other: &Self) -> f64 {
        let a = self.0.as_bytes();
        let b = other.0.as_bytes();
        let mut lcp = 0usize;
        while lcp < a.len() && lcp < b.len() && a[lcp] == b[lcp] {
            lcp += 1;
        }
        if lcp >= a.len() || lcp >= b.len() {
            // One is a prefix of the other: no differing byte to break ties
            // with; report the integer LCP exactly.
            return lcp as f64;
        }
        let diff = (i32::from(a[lcp]) - i32::from(b[lcp])).unsigned_abs();
        let frac = 1.0 - (f64::from(diff) / 256.0);
        lcp as f64 + frac.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

impl fmt::Display for NameID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default width, in bits, of a [`NumericID`].
pub const NUMERIC_ID_BITS: u32 = 128;

/// A fixed-width bitstring identifier used to place a peer on skip-ring
/// levels. Stored as the big-endian bits of a `u128`; `NUMERIC_ID_BITS`
/// documents the width the rest of the system assumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NumericID(u128);

impl NumericID {
    #[must_use]
    pub const fn from_bits(bits: u128) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u128 {
        self.0
    }

    /// Derive a `NumericID` by hashing an arbitrary seed (e.g. a random
    /// nonce chosen at startup, or a peer's name for reproducible tests).
    #[must_use]
    pub fn from_seed(seed: &[u8]) -> Self {
        let digest = blake3::hash(seed);
        let bytes = digest.as_bytes();
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&bytes[..16]);
        Self(u128::from_be_bytes(buf))
    }

    /// Draw a random `NumericID` (used when a peer is started without a
    /// fixed numeric-id argument).
    #[must_use]
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut seed = [0u8; 32];
        rng.fill(&mut seed);
        Self::from_seed(&seed)
    }

    /// Number of leading bits that agree with `other`.
    #[must_use]
    pub fn longest_prefix_length(self, other: Self) -> u32 {
        let x = self.0 ^ other.0;
        if x == 0 {
            NUMERIC_ID_BITS
        } else {
            x.leading_zeros().min(NUMERIC_ID_BITS)
        }
    }
}

impl fmt::Display for NumericID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// A real in the open interval `(0, 1)`. Totally orders skip-tree leaves
/// left-to-right.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionID(f64);

impl PartitionID {
    /// Construct from a raw value already known to lie in `(0, 1)`.
    ///
    /// Used when deserializing a value another peer already validated.
    #[must_use]
    pub fn from_raw(v: f64) -> Self {
        debug_assert!(v > 0.0 && v < 1.0, "partition-id out of range: {v}");
        Self(v)
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Draw uniformly from `(0, 1)`.
    ///
    /// # Errors
    /// Never fails for this fixed interval.
    pub fn gen<R: Rng + ?Sized>(rng: &mut R) -> Result<Self, CoreError> {
        Self::gen_btw_raw(rng, 0.0, 1.0)
    }

    /// Draw uniformly from `(0, r)`.
    ///
    /// # Errors
    /// Returns [`CoreError::Exhausted`] if `r <= 0`.
    pub fn gen_bef<R: Rng + ?Sized>(rng: &mut R, r: Self) -> Result<Self, CoreError> {
        Self::gen_btw_raw(rng, 0.0, r.0)
    }

    /// Draw uniformly from `(r, 1)`.
    ///
    /// # Errors
    /// Returns [`CoreError::Exhausted`] if `r >= 1`.
    pub fn gen_aft<R: Rng + ?Sized>(rng: &mut R, r: Self) -> Result<Self, CoreError> {
        Self::gen_btw_raw(rng, r.0, 1.0)
    }

    /// Draw uniformly from `(l, u)`.
    ///
    /// # Errors
    /// Returns [`CoreError::Exhausted`] if the open interval is numerically
    /// empty, i.e. `l >= u` or the interval contains no representable float
    /// strictly between the bounds.
    pub fn gen_btw<R: Rng + ?Sized>(rng: &mut R, l: Self, u: Self) -> Result<Self, CoreError> {
        Self::gen_btw_raw(rng, l.0, u.0)
    }

    fn gen_btw_raw<R: Rng + ?Sized>(rng: &mut R, l: f64, u: f64) -> Result<Self, CoreError> {
        if !(l < u) {
            return Err(CoreError::Exhausted);
        }
        // Reject draws that land on (or numerically collapse onto) either
        // bound; retry a bounded number of times before giving up, which
        // only happens when `l`/`u` are adjacent floats.
        for _ in 0..64 {
            let x = rng.random_range(l..u);
            if x > l && x < u {
                return Ok(Self(x));
            }
        }
        Err(CoreError::Exhausted)
    }
}

impl fmt::Display for PartitionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.8}", self.0)
    }
}

impl Eq for PartitionID {}

impl PartialOrd for PartitionID {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PartitionID {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Returns whether `b` lies strictly between `a` and `c` when scanning in
/// `direction`. When `can_wrap` is true, a single wrap across the ordering
/// cycle is permitted (e.g. for `Direction::Right`, `c < a` is allowed and
/// `b` may lie in `(a, MAX] ∪ [MIN, c)`).
#[must_use]
pub fn lies_between_direction<T: Ord>(direction: Direction, a: &T, b: &T, c: &T, can_wrap: bool) -> bool {
    match direction {
        Direction::Right => {
            if a < c {
                a < b && b < c
            } else if can_wrap {
                // wrapped: valid region is (a, +inf) ∪ (-inf, c)
                b > a || b < c
            } else {
                false
            }
        }
        Direction::Left => {
            if a > c {
                a > b && b > c
            } else if can_wrap {
                b < a || b > c
            } else {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn name_id_orders_lexicographically() {
        assert!(NameID::new("a") < NameID::new("b"));
        assert!(NameID::new("aa") < NameID::new("ab"));
    }

    #[test]
    fn numeric_id_prefix_length() {
        let a = NumericID::from_bits(0b1010_0000u128 << 120);
        let b = NumericID::from_bits(0b1010_1000u128 << 120);
        assert_eq!(a.longest_prefix_length(b), 4);
        assert_eq!(a.longest_prefix_length(a), NUMERIC_ID_BITS);
    }

    #[test]
    fn partition_id_gen_btw_strictly_between() {
        let mut rng = StdRng::seed_from_u64(7);
        let l = PartitionID::from_raw(0.2);
        let u = PartitionID::from_raw(0.8);
        for _ in 0..256 {
            let x = PartitionID::gen_btw(&mut rng, l, u).unwrap();
            assert!(x.value() > l.value());
            assert!(x.value() < u.value());
        }
    }

    #[test]
    fn partition_id_gen_btw_exhausted_on_empty_interval() {
        let mut rng = StdRng::seed_from_u64(3);
        let l = PartitionID::from_raw(0.5);
        let u = PartitionID::from_raw(0.5);
        assert_eq!(
            PartitionID::gen_btw(&mut rng, l, u).unwrap_err(),
            CoreError::Exhausted
        );
    }

    #[test]
    fn lies_between_no_wrap() {
        assert!(lies_between_direction(Direction::Right, &1, &2, &3, false));
        assert!(!lies_between_direction(Direction::Right, &1, &5, &3, false));
    }

    #[test]
    fn lies_between_with_wrap() {
        // scanning RIGHT from 8 towards 3, wrapping past the top: 9 qualifies.
        assert!(lies_between_direction(Direction::Right, &8, &9, &3, true));
        assert!(lies_between_direction(Direction::Right, &8, &1, &3, true));
        assert!(!lies_between_direction(Direction::Right, &8, &5, &3, true));
    }
}
