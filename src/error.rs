//! Error types (spec §7). Only conditions the spec says must *surface* to the
//! caller get a variant here — malformed detections and degenerate boxes are
//! dropped silently (with a `tracing` log) during construction, never
//! propagated as errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A query named a page index the model has no detections for.
    #[error("page {0} is out of range")]
    PageOutOfRange(usize),

    /// Internal invariant violated: `get_imgs`/`get_tables` must produce a
    /// caption-pass and footnote-pass result of equal length, one record per
    /// subject. If this fires it's a bug in the grouper, not bad input.
    #[error("assertion mismatch: {0}")]
    AssertionMismatch(String),

    /// Top-level input JSON doesn't match the wire schema at all (as opposed
    /// to a single malformed detection record, which is dropped, not
    /// rejected).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
