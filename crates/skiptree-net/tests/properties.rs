//! Property test: any byte string round-trips through netstring framing
//! unchanged, and a stream of several frames back to back reads back in
//! order.

use proptest::prelude::*;
use skiptree_net::{read_frame, write_frame};
use std::io::Cursor;

proptest! {
    #[test]
    fn single_frame_round_trips(payload in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut buf = Vec::new();
        write_frame(&mut buf, &payload).unwrap();

        let mut cur = Cursor::new(buf);
        let back = read_frame(&mut cur, 4096).unwrap();
        prop_assert_eq!(back, Some(payload));
    }

    #[test]
    fn several_frames_read_back_in_order(payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..8)) {
        let mut buf = Vec::new();
        for p in &payloads {
            write_frame(&mut buf, p).unwrap();
        }

        let mut cur = Cursor::new(buf);
        for expected in &payloads {
            let got = read_frame(&mut cur, 4096).unwrap();
            prop_assert_eq!(got.as_ref(), Some(expected));
        }
        prop_assert_eq!(read_frame(&mut cur, 4096).unwrap(), None);
    }
}
