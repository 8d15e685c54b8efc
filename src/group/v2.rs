//! Canonical subject–object grouper (spec §4.E). Pairs each subject (image
//! or table body) with the objects (captions, footnotes) that sit closest to
//! it on exactly one side, breaking ties by how well the candidate's
//! perpendicular extent matches the object's.

use crate::config::{PriorityPos, AXIS_MULTIPLICITY, VERTICAL_PRIORITY_RATIO};
use crate::entities::{Box, ScoredBox};
use crate::geometry::{bbox_distance, relative_pos};
use crate::reduce;

/// One subject and the objects that chose it. `sub_idx` is the subject's
/// index in the `subjects` slice passed to [`group`], stable across repeated
/// calls with different `object_cat`/`priority_pos` so callers can join two
/// passes (e.g. captions and footnotes) by index.
#[derive(Debug, Clone)]
pub struct V2Record {
    pub sub_idx: usize,
    pub sub_bbox: Box,
    pub sub_score: f64,
    pub obj_bboxes: Vec<ScoredBox>,
}

#[derive(Clone, Copy)]
struct Candidate {
    idx: usize, // index into the internally-sorted subject list
    dist: f64,
}

pub fn group(subjects: &[ScoredBox], objects: &[ScoredBox], priority_pos: PriorityPos) -> Vec<V2Record> {
    let subj_boxes: Vec<Box> = subjects.iter().map(|s| s.bbox).collect();
    let kept_subjects: Vec<(usize, ScoredBox)> = reduce::keep_indices(&subj_boxes)
        .into_iter()
        .map(|i| (i, subjects[i]))
        .collect();

    let obj_boxes: Vec<Box> = objects.iter().map(|o| o.bbox).collect();
    let kept_objects: Vec<ScoredBox> = reduce::keep_indices(&obj_boxes)
        .into_iter()
        .map(|i| objects[i])
        .collect();

    let mut sorted_subjects = kept_subjects;
    sorted_subjects.sort_by_key(|(_, s)| sort_key(&s.bbox));
    let mut sorted_objects = kept_objects;
    sorted_objects.sort_by_key(|o| sort_key(&o.bbox));

    let ns = sorted_subjects.len();
    let no = sorted_objects.len();

    let mut nearest_left: Vec<Option<Candidate>> = vec![None; no];
    let mut nearest_right: Vec<Option<Candidate>> = vec![None; no];
    let mut nearest_top: Vec<Option<Candidate>> = vec![None; no];
    let mut nearest_bottom: Vec<Option<Candidate>> = vec![None; no];

    for i in 0..no {
        let obj_box = sorted_objects[i].bbox;
        for j in 0..ns {
            let subj_box = sorted_subjects[j].1.bbox;
            let (shrunk_obj, shrunk_subj) = remove_mutual_overlap(obj_box, subj_box);
            let (left, right, bottom, top) = relative_pos(&shrunk_obj, &shrunk_subj);
            let flags = [left, right, bottom, top].iter().filter(|f| **f).count();
            if flags != 1 {
                continue;
            }
            let dist = bbox_distance(&obj_box, &subj_box);
            let cand = Candidate { idx: j, dist };
            let slot = if left {
                &mut nearest_left[i]
            } else if right {
                &mut nearest_right[i]
            } else if bottom {
                &mut nearest_bottom[i]
            } else {
                &mut nearest_top[i]
            };
            if slot.map_or(true, |c| dist < c.dist) {
                *slot = Some(cand);
            }
        }
    }

    let mut owner: Vec<Option<usize>> = vec![None; no];

    for i in 0..no {
        let obj_box = sorted_objects[i].bbox;
        let w = obj_box.width() as f64;
        let h = obj_box.height() as f64;
        let axis_unit = w.min(h);

        let top = nearest_top[i];
        let bottom = nearest_bottom[i];

        let mut chosen = None;
        if let (Some(t), Some(b)) = (top, bottom) {
            if matches!(priority_pos, PriorityPos::Up | PriorityPos::Bottom)
                && (t.dist - b.dist).abs() < VERTICAL_PRIORITY_RATIO * axis_unit
            {
                chosen = Some(match priority_pos {
                    PriorityPos::Up => t.idx,
                    _ => b.idx,
                });
            }
        }

        if chosen.is_none() {
            let left = nearest_left[i];
            let right = nearest_right[i];
            let h_cand = pick_on_axis(left, right, axis_unit, h, |j| {
                sorted_subjects[j].1.bbox.height() as f64
            });
            let v_cand = pick_on_axis(top, bottom, axis_unit, w, |j| {
                sorted_subjects[j].1.bbox.width() as f64
            });

            chosen = match (h_cand, v_cand) {
                (Some(hc), Some(vc)) => {
                    // H candidates are scored on height mismatch, V candidates on
                    // width mismatch (same convention as `pick_on_axis`'s `perp_of`).
                    let delta_hc = ratio_delta(sorted_subjects[hc.idx].1.bbox.height() as f64, h);
                    let delta_vc = ratio_delta(sorted_subjects[vc.idx].1.bbox.width() as f64, w);
                    if (delta_hc - delta_vc).abs() < AXIS_MULTIPLICITY * axis_unit {
                        Some(if w >= h { hc.idx } else { vc.idx })
                    } else if delta_hc < delta_vc {
                        Some(hc.idx)
                    } else {
                        Some(vc.idx)
                    }
                }
                (Some(hc), None) => Some(hc.idx),
                (None, Some(vc)) => Some(vc.idx),
                (None, None) => None,
            };
        }

        owner[i] = chosen;
    }

    let mut by_subject: Vec<Vec<ScoredBox>> = vec![Vec::new(); ns];
    for i in 0..no {
        if let Some(j) = owner[i] {
            by_subject[j].push(sorted_objects[i]);
        }
    }

    let mut records: Vec<V2Record> = sorted_subjects
        .into_iter()
        .enumerate()
        .map(|(j, (orig_idx, s))| V2Record {
            sub_idx: orig_idx,
            sub_bbox: s.bbox,
            sub_score: s.score,
            obj_bboxes: std::mem::take(&mut by_subject[j]),
        })
        .collect();
    records.sort_by_key(|r| r.sub_idx);
    records
}

/// 4.E.2: choose between two directional candidates on the same axis.
fn pick_on_axis(
    c1: Option<Candidate>,
    c2: Option<Candidate>,
    axis_unit: f64,
    obj_perp: f64,
    perp_of: impl Fn(usize) -> f64,
) -> Option<Candidate> {
    match (c1, c2) {
        (Some(a), Some(b)) => {
            if (a.dist - b.dist).abs() <= AXIS_MULTIPLICITY * axis_unit {
                let score_a = (perp_of(a.idx) - obj_perp).abs() + a.dist;
                let score_b = (perp_of(b.idx) - obj_perp).abs() + b.dist;
                Some(if score_a <= score_b { a } else { b })
            } else if a.dist <= b.dist {
                Some(a)
            } else {
                Some(b)
            }
        }
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

fn ratio_delta(candidate_extent: f64, obj_extent: f64) -> f64 {
    if obj_extent > 0.0 {
        (candidate_extent - obj_extent).abs() / obj_extent
    } else {
        f64::INFINITY
    }
}

fn sort_key(b: &Box) -> i64 {
    let x0 = b.x0 as i64;
    let y0 = b.y0 as i64;
    x0 * x0 + y0 * y0
}

/// 4.E.1: shrink the shorter overlap axis so the two boxes no longer
/// overlap, splitting the removed strip evenly between them. Returns
/// `(b1, b2)` with the same relative order as the inputs.
fn remove_mutual_overlap(b1: Box, b2: Box) -> (Box, Box) {
    let ov_x = (b1.x1.min(b2.x1) - b1.x0.max(b2.x0)).max(0);
    let ov_y = (b1.y1.min(b2.y1) - b1.y0.max(b2.y0)).max(0);
    if ov_x <= 0 || ov_y <= 0 {
        return (b1, b2);
    }

    if ov_x < ov_y {
        let shift = ov_x / 2;
        if b1.x0 <= b2.x0 {
            (Box::new(b1.x0, b1.y0, b1.x1 - shift, b1.y1), Box::new(b2.x0 + shift, b2.y0, b2.x1, b2.y1))
        } else {
            (Box::new(b1.x0 + shift, b1.y0, b1.x1, b1.y1), Box::new(b2.x0, b2.y0, b2.x1 - shift, b2.y1))
        }
    } else {
        let shift = ov_y / 2;
        if b1.y0 <= b2.y0 {
            (Box::new(b1.x0, b1.y0, b1.x1, b1.y1 - shift), Box::new(b2.x0, b2.y0 + shift, b2.x1, b2.y1))
        } else {
            (Box::new(b1.x0, b1.y0 + shift, b1.x1, b1.y1), Box::new(b2.x0, b2.y0, b2.x1, b2.y1 - shift))
        }
    }
}
