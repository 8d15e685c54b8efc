//! Compile-time configuration constants (spec §6.4). No runtime config file
//! or global state — every value here is a `pub const` bundled into
//! whichever call site needs it, per the Design Notes' directive against a
//! process-wide singleton.

/// Detections scoring at or below this are dropped during sanitization.
pub const LOW_CONF_THRESHOLD: f64 = 0.05;

/// IoU above this between two same-eligible-category detections triggers
/// high-IoU dedup, keeping the higher-scoring one.
pub const IOU_DUP_THRESHOLD: f64 = 0.9;

/// v1 quadrant-inclusion threshold: an object is folded into the winning
/// quadrant only if its overlap-area ratio with that quadrant exceeds this.
pub const CAPTION_OVERLAP_AREA_RATIO: f64 = 0.6;

/// v1 foreign-object veto: if the merged subject+object bbox overlaps some
/// unrelated detection by more than this multiple of the object's own area,
/// the candidate pairing is vetoed (distance forced to infinity).
pub const MERGE_BOX_OVERLAP_AREA_RATIO: f64 = 1.1;

/// `fixed_distance`'s size-mismatch filter: if the far box's perpendicular
/// extent exceeds the near box's by more than this fraction, treat the pair
/// as unreachable.
pub const SIZE_MISMATCH_RATIO: f64 = 0.3;

/// v2's axis tie-break tolerance, expressed as a multiple of the object's
/// axis unit (its shorter side).
pub const AXIS_MULTIPLICITY: f64 = 0.5;

/// v2's vertical-priority short-circuit tolerance multiplier.
pub const VERTICAL_PRIORITY_RATIO: f64 = 3.0;

/// Which side of the subject an object's distance ties are broken toward in
/// the v2 grouper (spec §4.E step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityPos {
    Up,
    Bottom,
    Left,
    Right,
    All,
}
