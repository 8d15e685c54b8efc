//! Query facade (spec §4.G): the only type downstream code touches. Built
//! once per document, read-only afterward.

use std::collections::HashMap;

use crate::config::PriorityPos;
use crate::dataset::Dataset;
use crate::entities::raw::RawPageDetections;
use crate::entities::{
    Box, CategoryId, CompoundImage, CompoundTable, Equation, OcrSpan, PageDetections, PageNo, Span, SpanType, ScoredBox,
};
use crate::error::{ReconcileError, Result};
use crate::group::{v1, v2};
use crate::normalize::normalize_page;
use crate::sanitize::sanitize_page;

/// A reconciled document: normalized, sanitized, read-only. Queries never
/// mutate it and may be called from multiple threads concurrently (spec §5).
#[derive(Debug)]
pub struct Model {
    pages: HashMap<PageNo, PageDetections>,
}

impl Model {
    /// Runs B and C (normalize, then the three sanitization passes) eagerly
    /// over every page. After this returns the model is immutable.
    #[tracing::instrument(skip_all)]
    pub fn new(raw_pages: Vec<RawPageDetections>, dataset: &impl Dataset) -> Self {
        let mut pages = HashMap::with_capacity(raw_pages.len());
        for raw in raw_pages {
            let page_no = raw.page_info.page_no;
            let page_info = match dataset.get_page(page_no) {
                Some(info) => info,
                None => {
                    tracing::warn!(page_no, "dropping page with no dataset entry");
                    continue;
                }
            };
            let mut page = normalize_page(&raw, page_info);
            sanitize_page(&mut page.detections);
            pages.insert(page_no, page);
        }
        Self { pages }
    }

    fn page(&self, page_no: PageNo) -> Result<&PageDetections> {
        self.pages.get(&page_no).ok_or(ReconcileError::PageOutOfRange(page_no))
    }

    fn select(page: &PageDetections, cat: CategoryId) -> Vec<ScoredBox> {
        page.detections
            .iter()
            .filter(|d| d.category == cat)
            .map(|d| ScoredBox { bbox: d.bbox, score: d.score })
            .collect()
    }

    fn other_than(page: &PageDetections, cats: &[CategoryId]) -> Vec<Box> {
        page.detections.iter().filter(|d| !cats.contains(&d.category)).map(|d| d.bbox).collect()
    }

    /// v1-backed image compounds. Captions and footnotes are each a
    /// zero-or-one-element list (v1 only ever unions its matches into a
    /// single box), unlike [`Self::get_imgs_v2`]'s per-object lists.
    pub fn get_imgs(&self, page_no: PageNo) -> Result<Vec<CompoundImage>> {
        let page = self.page(page_no)?;
        Self::get_v1_compounds(page, CategoryId::ImageBody, CategoryId::ImageCaption, CategoryId::ImageFootnote)
            .map(|recs| recs.into_iter().map(|(body, captions, footnotes, all_bbox)| CompoundImage { body, captions, footnotes, all_bbox }).collect())
    }

    pub fn get_tables(&self, page_no: PageNo) -> Result<Vec<CompoundTable>> {
        let page = self.page(page_no)?;
        Self::get_v1_compounds(page, CategoryId::TableBody, CategoryId::TableCaption, CategoryId::TableFootnote)
            .map(|recs| recs.into_iter().map(|(body, captions, footnotes, all_bbox)| CompoundTable { body, captions, footnotes, all_bbox }).collect())
    }

    fn get_v1_compounds(
        page: &PageDetections,
        subject_cat: CategoryId,
        caption_cat: CategoryId,
        footnote_cat: CategoryId,
    ) -> Result<Vec<(ScoredBox, Vec<ScoredBox>, Vec<ScoredBox>, Box)>> {
        let bodies = Self::select(page, subject_cat);
        let captions = Self::select(page, caption_cat);
        let footnotes = Self::select(page, footnote_cat);
        let other_for_captions = Self::other_than(page, &[subject_cat, caption_cat]);
        let other_for_footnotes = Self::other_than(page, &[subject_cat, footnote_cat]);

        let cap_recs = v1::group(&bodies, &captions, &other_for_captions);
        let fn_recs = v1::group(&bodies, &footnotes, &other_for_footnotes);

        if cap_recs.len() != fn_recs.len() {
            return Err(ReconcileError::AssertionMismatch(format!(
                "caption pass produced {} records, footnote pass produced {}",
                cap_recs.len(),
                fn_recs.len()
            )));
        }

        Ok(cap_recs
            .into_iter()
            .zip(fn_recs)
            .map(|(cap, fnr)| {
                let captions = match cap.object_body {
                    Some(b) => vec![ScoredBox { bbox: b, score: cap.subject_body.score }],
                    None => Vec::new(),
                };
                let footnotes = match fnr.object_body {
                    Some(b) => vec![ScoredBox { bbox: b, score: fnr.subject_body.score }],
                    None => Vec::new(),
                };
                let all_bbox = cap.all_bbox.merge(&fnr.all_bbox);
                (cap.subject_body, captions, footnotes, all_bbox)
            })
            .collect())
    }

    pub fn get_imgs_v2(&self, page_no: PageNo) -> Result<Vec<CompoundImage>> {
        let page = self.page(page_no)?;
        Ok(Self::get_v2_compounds(page, CategoryId::ImageBody, CategoryId::ImageCaption, CategoryId::ImageFootnote, PriorityPos::Bottom, PriorityPos::All)
            .into_iter()
            .map(|(body, captions, footnotes, all_bbox)| CompoundImage { body, captions, footnotes, all_bbox })
            .collect())
    }

    pub fn get_tables_v2(&self, page_no: PageNo) -> Result<Vec<CompoundTable>> {
        let page = self.page(page_no)?;
        Ok(Self::get_v2_compounds(page, CategoryId::TableBody, CategoryId::TableCaption, CategoryId::TableFootnote, PriorityPos::Up, PriorityPos::All)
            .into_iter()
            .map(|(body, captions, footnotes, all_bbox)| CompoundTable { body, captions, footnotes, all_bbox })
            .collect())
    }

    fn get_v2_compounds(
        page: &PageDetections,
        subject_cat: CategoryId,
        caption_cat: CategoryId,
        footnote_cat: CategoryId,
        caption_priority: PriorityPos,
        footnote_priority: PriorityPos,
    ) -> Vec<(ScoredBox, Vec<ScoredBox>, Vec<ScoredBox>, Box)> {
        let bodies = Self::select(page, subject_cat);
        let captions = Self::select(page, caption_cat);
        let footnotes = Self::select(page, footnote_cat);

        let cap_recs = v2::group(&bodies, &captions, caption_priority);
        let fn_recs = v2::group(&bodies, &footnotes, footnote_priority);
        let fn_by_sub: HashMap<usize, Vec<ScoredBox>> = fn_recs.into_iter().map(|r| (r.sub_idx, r.obj_bboxes)).collect();

        cap_recs
            .into_iter()
            .map(|cap| {
                let footnotes = fn_by_sub.get(&cap.sub_idx).cloned().unwrap_or_default();
                let body = ScoredBox { bbox: cap.sub_bbox, score: cap.sub_score };
                let all_bbox = Box::merge_all(
                    std::iter::once(&cap.sub_bbox)
                        .chain(cap.obj_bboxes.iter().map(|o| &o.bbox))
                        .chain(footnotes.iter().map(|o| &o.bbox)),
                )
                .unwrap_or(cap.sub_bbox);
                (body, cap.obj_bboxes, footnotes, all_bbox)
            })
            .collect()
    }

    pub fn get_equations(&self, page_no: PageNo) -> Result<(Vec<Equation>, Vec<Equation>, Vec<Equation>)> {
        let page = self.page(page_no)?;
        let as_equations = |cat: CategoryId| {
            page.detections
                .iter()
                .filter(|d| d.category == cat)
                .map(|d| Equation { bbox: d.bbox, score: d.score, latex: d.extra.latex.clone() })
                .collect::<Vec<_>>()
        };
        Ok((as_equations(CategoryId::Embedding), as_equations(CategoryId::InterlineEquationSpan), as_equations(CategoryId::IsolateFormula)))
    }

    pub fn get_discarded(&self, page_no: PageNo) -> Result<Vec<ScoredBox>> {
        Ok(Self::select(self.page(page_no)?, CategoryId::Abandon))
    }

    pub fn get_text_blocks(&self, page_no: PageNo) -> Result<Vec<ScoredBox>> {
        Ok(Self::select(self.page(page_no)?, CategoryId::PlainText))
    }

    pub fn get_title_blocks(&self, page_no: PageNo) -> Result<Vec<ScoredBox>> {
        Ok(Self::select(self.page(page_no)?, CategoryId::Title))
    }

    pub fn get_ocr_text(&self, page_no: PageNo) -> Result<Vec<OcrSpan>> {
        let page = self.page(page_no)?;
        Ok(page
            .detections
            .iter()
            .filter(|d| d.category == CategoryId::OcrText)
            .map(|d| OcrSpan { bbox: d.bbox, score: d.score, content: d.extra.text.clone().unwrap_or_default() })
            .collect())
    }

    pub fn get_all_spans(&self, page_no: PageNo) -> Result<Vec<Span>> {
        let page = self.page(page_no)?;
        let mut spans = Vec::new();
        for d in &page.detections {
            let kind = match d.category {
                CategoryId::ImageBody => SpanType::Image,
                CategoryId::TableBody => {
                    if d.extra.latex.is_some() {
                        SpanType::Table { latex: d.extra.latex.clone(), html: None }
                    } else {
                        SpanType::Table { latex: None, html: d.extra.html.clone() }
                    }
                }
                CategoryId::InlineEquationSpan => SpanType::InlineEquation { content: d.extra.latex.clone() },
                CategoryId::InterlineEquationSpan => SpanType::InterlineEquation { content: d.extra.latex.clone() },
                CategoryId::OcrText => SpanType::Text { content: d.extra.text.clone() },
                _ => continue,
            };
            spans.push(Span { bbox: d.bbox, score: d.score, kind });
        }

        let mut deduped: Vec<Span> = Vec::with_capacity(spans.len());
        for span in spans {
            if !deduped.iter().any(|existing| *existing == span) {
                deduped.push(span);
            }
        }
        Ok(deduped)
    }

    pub fn get_page_size(&self, page_no: PageNo) -> Result<(f64, f64)> {
        let page = self.page(page_no)?;
        Ok((page.page_w, page.page_h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;
    use crate::entities::raw::{RawDetection, RawPageInfo};

    fn det(category_id: i64, score: f64, bbox: [f64; 4]) -> RawDetection {
        RawDetection { category_id, score, bbox: Some(bbox), poly: None, latex: None, html: None, text: None }
    }

    fn single_page_model(dets: Vec<RawDetection>) -> Model {
        let raw = RawPageDetections {
            page_info: RawPageInfo { page_no: 0, width: 1000.0, height: 1000.0 },
            layout_dets: dets,
        };
        let mut ds = InMemoryDataset::new();
        ds.insert(0, 1000.0, 1000.0);
        Model::new(vec![raw], &ds)
    }

    #[test]
    fn unknown_page_is_out_of_range() {
        let model = single_page_model(vec![]);
        assert!(matches!(model.get_title_blocks(5), Err(ReconcileError::PageOutOfRange(5))));
    }

    #[test]
    fn image_with_caption_and_footnote_reconciles() {
        let model = single_page_model(vec![
            det(3, 0.9, [100.0, 100.0, 300.0, 300.0]),
            det(4, 0.9, [100.0, 310.0, 300.0, 340.0]),
            det(7, 0.9, [100.0, 350.0, 300.0, 380.0]),
        ]);
        let imgs = model.get_imgs(0).unwrap();
        assert_eq!(imgs.len(), 1);
        assert_eq!(imgs[0].footnotes.len(), 1, "table_footnote should have been relabeled and picked up as image footnote");
    }

    #[test]
    fn get_page_size_reports_dataset_dims() {
        let model = single_page_model(vec![]);
        assert_eq!(model.get_page_size(0).unwrap(), (1000.0, 1000.0));
    }

    #[test]
    fn get_all_spans_dedups_exact_duplicates() {
        let model = single_page_model(vec![
            det(15, 0.9, [0.0, 0.0, 10.0, 10.0]),
            det(15, 0.9, [0.0, 0.0, 10.0, 10.0]),
        ]);
        let spans = model.get_all_spans(0).unwrap();
        assert_eq!(spans.len(), 1);
    }
}
