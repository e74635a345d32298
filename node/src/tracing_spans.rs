//! Pre-built [`tracing::Span`] constructors for node operations.
//!
//! Consistent span names and fields make production cycles easy to filter
//! and correlate in log output.

use tracing::{info_span, Span};

/// Span covering one block production cycle.
///
/// `block` and `intents` are recorded once known.
pub fn production_cycle_span(trigger: &str) -> Span {
    info_span!(
        "production_cycle",
        trigger = %trigger,
        block = tracing::field::Empty,
        intents = tracing::field::Empty
    )
}

/// Span covering admission of one submitted intent.
pub fn intent_submit_span(id: &str, kind: &str) -> Span {
    info_span!("intent_submit", id = %id, kind = %kind)
}

