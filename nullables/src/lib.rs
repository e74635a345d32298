//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies (clock, storage) sit behind traits. This crate
//! provides both the production clock and test-friendly implementations
//! that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod store;

pub use clock::{Clock, NullClock, SystemClock};
pub use store::NullStore;
