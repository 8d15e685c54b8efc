//! Subject–object grouping (spec §4.E, §4.F): two independent algorithms
//! over the same inputs, kept side by side because the query facade exposes
//! both.

pub mod v1;
pub mod v2;

pub use v1::V1Record;
pub use v2::V2Record;
