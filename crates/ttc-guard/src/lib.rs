//! ttc-guard
//!
//! Transition guard for a tag's transport sub-state machine.
//!
//! # State diagram
//!
//! ```text
//!            request      confirm
//!   Assigned ────────► (pending) ────────► InProgress ────────► Arrived (term.)
//!      ▲                   │    start_transport      mark_arrived
//!      └───────────────────┘
//!            cancel (no write)
//!
//!   Completed — legacy terminal, equivalent to Arrived for guard purposes.
//! ```
//!
//! Guard functions are pure: they validate the transition against the
//! tag's canonical status and build a [`TagPatch`](ttc_store::TagPatch)
//! for the caller to persist. No storage access, no clock — the caller
//! supplies `now`. An illegal transition is rejected before any patch is
//! built; rejection is a precondition failure, not a retryable error.

mod confirm;
mod transitions;

pub use confirm::ConfirmSlot;
pub use transitions::{
    check_actionable, mark_arrived, start_transport, AdmissionError, TransitionError,
};
