//! Coordinate normalizer (spec §4.B): rescales detector coordinates into
//! page space and drops anything degenerate or malformed.

use crate::dataset::PageInfo;
use crate::entities::{raw::RawDetection, raw::RawPageDetections, Box, CategoryId, Detection, DetectionExtra, PageDetections};

/// One page's worth of normalized detections, plus the true page dimensions
/// used as the scale target.
pub fn normalize_page(raw: &RawPageDetections, page_info: PageInfo) -> PageDetections {
    let scale_x = if page_info.w > 0.0 {
        raw.page_info.width / page_info.w
    } else {
        1.0
    };
    let scale_y = if page_info.h > 0.0 {
        raw.page_info.height / page_info.h
    } else {
        1.0
    };

    let detections = raw
        .layout_dets
        .iter()
        .filter_map(|det| normalize_detection(det, scale_x, scale_y))
        .collect();

    PageDetections {
        page_no: raw.page_info.page_no,
        page_w: page_info.w,
        page_h: page_info.h,
        detections,
    }
}

fn normalize_detection(det: &RawDetection, scale_x: f64, scale_y: f64) -> Option<Detection> {
    if !(0.0..=1.0).contains(&det.score) {
        tracing::warn!(score = det.score, "dropping malformed detection: score out of [0,1]");
        return None;
    }

    let raw_box = match (det.bbox, det.poly) {
        (Some(b), _) => b,
        (None, Some(p)) => [p[0], p[1], p[4], p[5]],
        (None, None) => {
            tracing::warn!("dropping malformed detection: neither bbox nor poly present");
            return None;
        }
    };

    let category = match CategoryId::from_raw(det.category_id) {
        Some(c) => c,
        None => {
            tracing::warn!(category_id = det.category_id, "dropping detection with unknown category id");
            return None;
        }
    };

    let bbox = Box::new(
        (raw_box[0] / scale_x).trunc() as i32,
        (raw_box[1] / scale_y).trunc() as i32,
        (raw_box[2] / scale_x).trunc() as i32,
        (raw_box[3] / scale_y).trunc() as i32,
    );

    if bbox.is_degenerate() {
        tracing::debug!(?bbox, "dropping degenerate box after rescale");
        return None;
    }

    Some(Detection {
        bbox,
        score: det.score,
        category,
        extra: DetectionExtra {
            latex: det.latex.clone(),
            html: det.html.clone(),
            text: det.text.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::raw::RawPageInfo;

    fn page_info(w: f64, h: f64) -> PageInfo {
        PageInfo { w, h }
    }

    #[test]
    fn bbox_field_preferred_over_poly() {
        let raw = RawDetection {
            category_id: 1,
            score: 0.9,
            bbox: Some([10.0, 10.0, 20.0, 20.0]),
            poly: Some([0.0, 0.0, 99.0, 0.0, 99.0, 99.0, 0.0, 99.0]),
            latex: None,
            html: None,
            text: None,
        };
        let det = normalize_detection(&raw, 1.0, 1.0).unwrap();
        assert_eq!(det.bbox, Box::new(10, 10, 20, 20));
    }

    #[test]
    fn poly_used_when_no_bbox() {
        let raw = RawDetection {
            category_id: 1,
            score: 0.9,
            bbox: None,
            poly: Some([10.0, 10.0, 20.0, 10.0, 20.0, 20.0, 10.0, 20.0]),
            latex: None,
            html: None,
            text: None,
        };
        let det = normalize_detection(&raw, 1.0, 1.0).unwrap();
        assert_eq!(det.bbox, Box::new(10, 10, 20, 20));
    }

    #[test]
    fn missing_bbox_and_poly_is_dropped() {
        let raw = RawDetection {
            category_id: 1,
            score: 0.9,
            bbox: None,
            poly: None,
            latex: None,
            html: None,
            text: None,
        };
        assert!(normalize_detection(&raw, 1.0, 1.0).is_none());
    }

    #[test]
    fn out_of_range_score_is_dropped() {
        let raw = RawDetection {
            category_id: 1,
            score: 1.5,
            bbox: Some([0.0, 0.0, 10.0, 10.0]),
            poly: None,
            latex: None,
            html: None,
            text: None,
        };
        assert!(normalize_detection(&raw, 1.0, 1.0).is_none());
    }

    #[test]
    fn degenerate_after_rescale_is_dropped() {
        let raw = RawDetection {
            category_id: 1,
            score: 0.9,
            bbox: Some([10.0, 10.0, 10.0, 20.0]),
            poly: None,
            latex: None,
            html: None,
            text: None,
        };
        assert!(normalize_detection(&raw, 1.0, 1.0).is_none());
    }

    #[test]
    fn scale_idempotent_at_1_to_1() {
        let raw_page = RawPageDetections {
            page_info: RawPageInfo { page_no: 0, width: 1000.0, height: 1000.0 },
            layout_dets: vec![RawDetection {
                category_id: 3,
                score: 0.9,
                bbox: Some([100.0, 100.0, 300.0, 300.0]),
                poly: None,
                latex: None,
                html: None,
                text: None,
            }],
        };
        let page = normalize_page(&raw_page, page_info(1000.0, 1000.0));
        assert_eq!(page.detections[0].bbox, Box::new(100, 100, 300, 300));
    }

    #[test]
    fn rescales_by_ratio_of_image_to_page_dims() {
        let raw_page = RawPageDetections {
            page_info: RawPageInfo { page_no: 0, width: 2000.0, height: 2000.0 },
            layout_dets: vec![RawDetection {
                category_id: 3,
                score: 0.9,
                bbox: Some([200.0, 200.0, 600.0, 600.0]),
                poly: None,
                latex: None,
                html: None,
                text: None,
            }],
        };
        // image is 2x the page: coordinates should be halved.
        let page = normalize_page(&raw_page, page_info(1000.0, 1000.0));
        assert_eq!(page.detections[0].bbox, Box::new(100, 100, 300, 300));
    }
}
