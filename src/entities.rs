//! Data model (spec §3): boxes, detections, pages, and the compound shapes
//! the query facade hands back to callers.

use serde::{Deserialize, Serialize};

pub type PageNo = usize;

/// An axis-aligned box in page coordinate space. Invariant: `x1 > x0 && y1 >
/// y0`, enforced by every constructor that can observe a degenerate result
/// (see [`crate::normalize`]).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Box {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Box {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    #[inline(always)]
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// The minimal box enclosing both inputs.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn merge_all<'a>(boxes: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        boxes.into_iter().copied().reduce(|a, b| a.merge(&b))
    }
}

/// Closed category set (spec §3.2). `ImageFootnote` is synthetic: it never
/// appears in raw input, only after [`crate::sanitize`] relabels a
/// `TableFootnote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryId {
    Title,
    PlainText,
    Abandon,
    ImageBody,
    ImageCaption,
    TableBody,
    TableCaption,
    TableFootnote,
    IsolateFormula,
    Embedding,
    InlineEquationSpan,
    InterlineEquationSpan,
    OcrText,
    ImageFootnote,
}

impl CategoryId {
    pub fn from_raw(id: i64) -> Option<Self> {
        use CategoryId::*;
        Some(match id {
            0 => Title,
            1 => PlainText,
            2 => Abandon,
            3 => ImageBody,
            4 => ImageCaption,
            5 => TableBody,
            6 => TableCaption,
            7 => TableFootnote,
            8 => IsolateFormula,
            9 => Embedding,
            13 => InlineEquationSpan,
            14 => InterlineEquationSpan,
            15 => OcrText,
            101 => ImageFootnote,
            _ => return None,
        })
    }

    /// Categories eligible for the high-IoU dedup pass (spec §4.C pass 2):
    /// the closed `0..=9` range.
    pub fn is_dedup_eligible(self) -> bool {
        use CategoryId::*;
        matches!(
            self,
            Title
                | PlainText
                | Abandon
                | ImageBody
                | ImageCaption
                | TableBody
                | TableCaption
                | TableFootnote
                | IsolateFormula
                | Embedding
        )
    }
}

/// Detection-carried payload that isn't geometry or score (spec §3.1 `extra`).
#[derive(Debug, Clone, Default)]
pub struct DetectionExtra {
    pub latex: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,
}

/// A single normalized, sanitized detection.
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: Box,
    pub score: f64,
    pub category: CategoryId,
    pub extra: DetectionExtra,
}

/// All detections for one page, plus the page's true dimensions (from the
/// [`crate::dataset::Dataset`] collaborator, not the detector's image space).
#[derive(Debug, Clone)]
pub struct PageDetections {
    pub page_no: PageNo,
    pub page_w: f64,
    pub page_h: f64,
    pub detections: Vec<Detection>,
}

/// One box + its detector confidence, the shape most query accessors return.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredBox {
    pub bbox: Box,
    pub score: f64,
}

/// An image compound: body plus zero or more captions/footnotes, and the
/// minimal box enclosing all of them (spec §3.1, §9.1 "`all` union bbox").
#[derive(Debug, Clone, Serialize)]
pub struct CompoundImage {
    pub body: ScoredBox,
    pub captions: Vec<ScoredBox>,
    pub footnotes: Vec<ScoredBox>,
    pub all_bbox: Box,
}

/// A table compound: identical shape to [`CompoundImage`].
#[derive(Debug, Clone, Serialize)]
pub struct CompoundTable {
    pub body: ScoredBox,
    pub captions: Vec<ScoredBox>,
    pub footnotes: Vec<ScoredBox>,
    pub all_bbox: Box,
}

/// An equation detection carrying its LaTeX transcription.
#[derive(Debug, Clone, Serialize)]
pub struct Equation {
    pub bbox: Box,
    pub score: f64,
    pub latex: Option<String>,
}

/// An OCR text span.
#[derive(Debug, Clone, Serialize)]
pub struct OcrSpan {
    pub bbox: Box,
    pub score: f64,
    pub content: String,
}

/// The shaped span union returned by `all_spans` (spec §4.G).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SpanType {
    Image,
    Table { latex: Option<String>, html: Option<String> },
    InlineEquation { content: Option<String> },
    InterlineEquation { content: Option<String> },
    Text { content: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Span {
    pub bbox: Box,
    pub score: f64,
    #[serde(flatten)]
    pub kind: SpanType,
}

/// Wire schema (spec §6.1): what the upstream vision pipeline hands in.
pub mod raw {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct RawPageInfo {
        pub page_no: usize,
        pub width: f64,
        pub height: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct RawDetection {
        pub category_id: i64,
        pub score: f64,
        #[serde(default)]
        pub bbox: Option<[f64; 4]>,
        #[serde(default)]
        pub poly: Option<[f64; 8]>,
        #[serde(default)]
        pub latex: Option<String>,
        #[serde(default)]
        pub html: Option<String>,
        #[serde(default)]
        pub text: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct RawPageDetections {
        pub page_info: RawPageInfo,
        pub layout_dets: Vec<RawDetection>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_grows_to_enclose_both() {
        let a = Box::new(0, 0, 10, 10);
        let b = Box::new(5, 5, 20, 8);
        let m = a.merge(&b);
        assert_eq!(m, Box::new(0, 0, 20, 10));
    }

    #[test]
    fn degenerate_box_detection() {
        assert!(Box::new(5, 5, 5, 10).is_degenerate());
        assert!(Box::new(5, 5, 10, 5).is_degenerate());
        assert!(!Box::new(5, 5, 10, 10).is_degenerate());
    }

    #[test]
    fn category_from_raw_closed_set() {
        assert_eq!(CategoryId::from_raw(3), Some(CategoryId::ImageBody));
        assert_eq!(CategoryId::from_raw(101), Some(CategoryId::ImageFootnote));
        assert_eq!(CategoryId::from_raw(42), None);
    }
}
