//! Geometric layout-reconciliation engine: turns a page of raw detector
//! output into reconciled document objects (image/table compounds,
//! equations, text blocks, OCR spans) via coordinate normalization,
//! sanitization, and subject-object grouping.

pub mod config;
pub mod dataset;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod group;
pub mod model;
pub mod normalize;
pub mod reduce;
pub mod sanitize;

pub use config::PriorityPos;
pub use dataset::{Dataset, InMemoryDataset, PageInfo};
pub use entities::raw::{RawDetection, RawPageDetections, RawPageInfo};
pub use entities::{
    Box, CategoryId, CompoundImage, CompoundTable, Detection, Equation, OcrSpan, PageDetections, PageNo, ScoredBox, Span, SpanType,
};
pub use error::{ReconcileError, Result};
pub use model::Model;
