//! Detection sanitizer (spec §4.C): three ordered passes run once per page
//! during `Model` construction — low-confidence prune, high-IoU dedup,
//! footnote reclassification.

use crate::config::{IOU_DUP_THRESHOLD, LOW_CONF_THRESHOLD, SIZE_MISMATCH_RATIO};
use crate::entities::{Box, CategoryId, Detection};
use crate::geometry::{float_gt, iou, relative_pos, bbox_distance};

/// Runs all three passes in order against one page's detections, in place.
pub fn sanitize_page(detections: &mut Vec<Detection>) {
    let before = detections.len();
    prune_low_confidence(detections);
    tracing::debug!(dropped = before - detections.len(), "low-confidence prune");

    let before = detections.len();
    dedup_high_iou(detections);
    tracing::debug!(dropped = before - detections.len(), "high-IoU dedup");

    let relabeled = reclassify_footnotes(detections);
    tracing::debug!(relabeled, "footnote reclassification");
}

fn prune_low_confidence(detections: &mut Vec<Detection>) {
    detections.retain(|d| d.score > LOW_CONF_THRESHOLD);
}

fn dedup_high_iou(detections: &mut Vec<Detection>) {
    let n = detections.len();
    let mut marked = vec![false; n];

    for i in 0..n {
        for j in 0..n {
            if i == j || marked[i] {
                continue;
            }
            if !detections[i].category.is_dedup_eligible() || !detections[j].category.is_dedup_eligible() {
                continue;
            }
            if iou(&detections[i].bbox, &detections[j].bbox) <= IOU_DUP_THRESHOLD {
                continue;
            }
            // Mark the lower-scoring one; on an exact tie keep whichever was
            // encountered first (the lower index).
            if detections[j].score > detections[i].score
                || (detections[j].score == detections[i].score && j < i)
            {
                marked[i] = true;
            }
        }
    }

    let mut idx = 0;
    detections.retain(|_| {
        let keep = !marked[idx];
        idx += 1;
        keep
    });
}

/// `fixed_distance` (spec §4.C.1): distance between two boxes that lie
/// clearly on one side of each other, rejecting diagonal arrangements and
/// size-mismatched pairs.
pub fn fixed_distance(b1: &Box, b2: &Box) -> f64 {
    let (left, right, bottom, top) = relative_pos(b1, b2);
    let flags = [left, right, bottom, top].iter().filter(|f| **f).count();
    if flags > 1 {
        return f64::INFINITY;
    }

    let horizontally_separated = left || right;
    let (l1, l2) = if horizontally_separated {
        (b1.height() as f64, b2.height() as f64)
    } else {
        (b1.width() as f64, b2.width() as f64)
    };

    // Symmetric by construction (spec §8 requires fixed_distance(a,b) ==
    // fixed_distance(b,a)): compare against the smaller extent regardless of
    // which argument it came from, rather than always normalizing by `l1`.
    let (lo, hi) = if l1 <= l2 { (l1, l2) } else { (l2, l1) };
    if lo > 0.0 && float_gt((hi - lo) / lo, SIZE_MISMATCH_RATIO) {
        return f64::INFINITY;
    }

    bbox_distance(b1, b2)
}

fn reclassify_footnotes(detections: &mut [Detection]) -> usize {
    let has_footnote = detections.iter().any(|d| d.category == CategoryId::TableFootnote);
    let has_figure = detections.iter().any(|d| d.category == CategoryId::ImageBody);
    if !has_footnote || !has_figure {
        return 0;
    }

    let footnote_idx: Vec<usize> = detections
        .iter()
        .enumerate()
        .filter(|(_, d)| d.category == CategoryId::TableFootnote)
        .map(|(i, _)| i)
        .collect();

    let mut relabel = Vec::new();
    for &fi in &footnote_idx {
        let f = &detections[fi].bbox;

        let min_dist_to_figure = detections
            .iter()
            .filter(|d| d.category == CategoryId::ImageBody)
            .map(|g| fixed_distance(f, &g.bbox))
            .filter(|d| d.is_finite())
            .fold(None, |acc: Option<f64>, d| match acc {
                Some(a) if a <= d => Some(a),
                _ => Some(d),
            });

        let min_dist_to_table = detections
            .iter()
            .filter(|d| d.category == CategoryId::TableBody)
            .map(|t| fixed_distance(f, &t.bbox))
            .filter(|d| d.is_finite())
            .fold(None, |acc: Option<f64>, d| match acc {
                Some(a) if a <= d => Some(a),
                _ => Some(d),
            });

        if let Some(to_figure) = min_dist_to_figure {
            let closer_than_table = match min_dist_to_table {
                Some(to_table) => float_gt(to_table, to_figure),
                None => true,
            };
            if closer_than_table {
                relabel.push(fi);
            }
        }
    }

    for &idx in &relabel {
        detections[idx].category = CategoryId::ImageFootnote;
    }
    relabel.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::DetectionExtra;

    fn det(category: CategoryId, score: f64, b: Box) -> Detection {
        Detection {
            bbox: b,
            score,
            category,
            extra: DetectionExtra::default(),
        }
    }

    #[test]
    fn low_confidence_is_pruned() {
        let mut v = vec![
            det(CategoryId::PlainText, 0.05, Box::new(0, 0, 10, 10)),
            det(CategoryId::PlainText, 0.06, Box::new(0, 0, 10, 10)),
        ];
        prune_low_confidence(&mut v);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].score, 0.06);
    }

    #[test]
    fn high_iou_dedup_keeps_higher_score() {
        let mut v = vec![
            det(CategoryId::PlainText, 0.5, Box::new(0, 0, 10, 10)),
            det(CategoryId::PlainText, 0.9, Box::new(0, 0, 10, 10)),
        ];
        dedup_high_iou(&mut v);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].score, 0.9);
    }

    #[test]
    fn high_iou_dedup_tie_keeps_first() {
        let mut v = vec![
            det(CategoryId::PlainText, 0.9, Box::new(0, 0, 10, 10)),
            det(CategoryId::PlainText, 0.9, Box::new(0, 0, 10, 10)),
        ];
        dedup_high_iou(&mut v);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].bbox, Box::new(0, 0, 10, 10));
    }

    #[test]
    fn dedup_ignores_categories_outside_closed_set() {
        let mut v = vec![
            det(CategoryId::OcrText, 0.5, Box::new(0, 0, 10, 10)),
            det(CategoryId::OcrText, 0.9, Box::new(0, 0, 10, 10)),
        ];
        dedup_high_iou(&mut v);
        assert_eq!(v.len(), 2, "OcrText is not dedup-eligible");
    }

    #[test]
    fn fixed_distance_infinite_on_diagonal() {
        let a = Box::new(0, 0, 10, 10);
        let b = Box::new(20, 20, 30, 30);
        assert!(fixed_distance(&a, &b).is_infinite());
    }

    #[test]
    fn fixed_distance_infinite_on_size_mismatch() {
        let small = Box::new(0, 0, 10, 10);
        let large = Box::new(20, 0, 30, 1000);
        assert!(fixed_distance(&small, &large).is_infinite());
    }

    #[test]
    fn fixed_distance_is_symmetric() {
        let a = Box::new(0, 0, 10, 10);
        let b = Box::new(20, 2, 30, 8);
        assert_eq!(fixed_distance(&a, &b), fixed_distance(&b, &a));
    }

    #[test]
    fn footnote_reclassified_when_closer_to_figure() {
        let mut v = vec![
            det(CategoryId::ImageBody, 0.9, Box::new(100, 100, 300, 300)),
            det(CategoryId::TableFootnote, 0.9, Box::new(100, 310, 300, 340)),
        ];
        let n = reclassify_footnotes(&mut v);
        assert_eq!(n, 1);
        assert_eq!(v[1].category, CategoryId::ImageFootnote);
    }

    #[test]
    fn footnote_untouched_when_no_figure_present() {
        let mut v = vec![
            det(CategoryId::TableBody, 0.9, Box::new(0, 0, 400, 400)),
            det(CategoryId::TableFootnote, 0.9, Box::new(0, 410, 400, 430)),
        ];
        let n = reclassify_footnotes(&mut v);
        assert_eq!(n, 0);
        assert_eq!(v[1].category, CategoryId::TableFootnote);
    }

    #[test]
    fn footnote_kept_when_table_strictly_closer() {
        let mut v = vec![
            det(CategoryId::TableBody, 0.9, Box::new(0, 0, 400, 400)),
            det(CategoryId::ImageBody, 0.9, Box::new(0, 1000, 400, 1300)),
            det(CategoryId::TableFootnote, 0.9, Box::new(0, 410, 400, 430)),
        ];
        let n = reclassify_footnotes(&mut v);
        assert_eq!(n, 0);
        assert_eq!(v[2].category, CategoryId::TableFootnote);
    }
}
