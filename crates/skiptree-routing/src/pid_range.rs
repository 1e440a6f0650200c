//! `PidRange` — the narrowing partition-id window a by-CPE envelope is
//! still permitted to visit.

use skiptree_core::{PartitionID, Range};

/// A range over partition-ids. Narrows monotonically as a by-CPE envelope
/// is forwarded, preventing cycles and duplicate delivery (§4.6).
pub type PidRange = Range<PartitionID>;

/// Whether `pid` is still a permitted destination under this window.
#[must_use]
pub fn includes_pid(range: &PidRange, pid: PartitionID) -> bool {
    range.includes_value(&pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_excludes_pid_outside_window() {
        let full = PidRange::unbounded();
        assert!(includes_pid(&full, PartitionID::from_raw(0.5)));

        let narrowed = full.restrict(skiptree_core::Direction::Right, PartitionID::from_raw(0.6));
        assert!(!includes_pid(&narrowed, PartitionID::from_raw(0.5)));
        assert!(includes_pid(&narrowed, PartitionID::from_raw(0.7)));
    }
}
