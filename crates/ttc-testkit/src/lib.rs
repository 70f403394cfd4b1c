//! ttc-testkit
//!
//! In-process test tooling for the transport tag core: an in-memory
//! implementation of the store traits with race-simulation knobs,
//! fixture builders, and the scenario tests under `tests/`.
//!
//! Nothing here touches a real database or network; scenario tests are
//! pure in-process.

mod fixtures;
mod memory_store;

pub use fixtures::{tag_assigned, tag_in_progress, tag_unassigned, ts0};
pub use memory_store::{MemoryFeedStream, MemoryTagStore};

/// Initialise tracing output for tests. Safe to call from every test;
/// only the first call installs the subscriber.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
