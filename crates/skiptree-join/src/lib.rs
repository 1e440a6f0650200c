//! SkipNet join, skip-tree join, and neighbourhood repair (§4.7, §4.8):
//! the protocol state machines that grow the overlay one peer at a time.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod error;
pub mod repair;
pub mod sn_join;
pub mod st_join;

pub use error::JoinError;
pub use repair::{fix_from_level, ping_full_ring, repair_level, step_fixup_higher, FixupStep, RepairOutcome};
pub use sn_join::{build_st_ask, choose_st_contact, handle_at_seed, handle_at_terminus, start_join};
pub use st_join::{error_reply, PendingWelcome, WelcomeState};
