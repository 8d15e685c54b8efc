//! Legacy subject–object grouper (spec §4.F), retained because `get_imgs`
//! and `get_tables` expose its output shape. Ported from the same algorithm
//! as [`super::v2`]'s canonical replacement, kept around for its distinct
//! merge-and-quadrant-partition behavior.

use std::collections::HashSet;

use crate::config::{CAPTION_OVERLAP_AREA_RATIO, MERGE_BOX_OVERLAP_AREA_RATIO};
use crate::entities::{Box, ScoredBox};
use crate::geometry::{area, float_gt, is_in, is_part_overlap, overlap_area, relative_pos, bbox_distance};
use crate::reduce;
use crate::sanitize::fixed_distance;

/// One subject and the union of whatever objects it absorbed.
#[derive(Debug, Clone)]
pub struct V1Record {
    pub subject_body: ScoredBox,
    pub object_body: Option<Box>,
    pub all_bbox: Box,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Subject,
    Object,
}

#[derive(Clone, Copy)]
struct Entry {
    kind: Kind,
    bbox: Box,
    score: f64,
}

/// `other_category_boxes` is every page detection whose category is neither
/// `subject_cat` nor `object_cat` — used only for the merge-box veto that
/// keeps a caption's reach from crossing unrelated content.
pub fn group(subjects: &[ScoredBox], objects: &[ScoredBox], other_category_boxes: &[Box]) -> Vec<V1Record> {
    let subj_boxes: Vec<Box> = subjects.iter().map(|s| s.bbox).collect();
    let mut subj: Vec<ScoredBox> = reduce::keep_indices(&subj_boxes).into_iter().map(|i| subjects[i]).collect();
    subj.sort_by_key(|s| sort_key(&s.bbox));

    let obj_boxes: Vec<Box> = objects.iter().map(|o| o.bbox).collect();
    let obj: Vec<ScoredBox> = reduce::keep_indices(&obj_boxes).into_iter().map(|i| objects[i]).collect();

    let ns = subj.len();
    let no = obj.len();
    let n = ns + no;

    let mut entries = Vec::with_capacity(n);
    entries.extend(subj.iter().map(|s| Entry { kind: Kind::Subject, bbox: s.bbox, score: s.score }));
    entries.extend(obj.iter().map(|o| Entry { kind: Kind::Object, bbox: o.bbox, score: o.score }));

    let mut dis = vec![vec![f64::INFINITY; n]; n];
    for i in 0..n {
        for j in 0..i {
            if entries[i].kind == Kind::Subject && entries[j].kind == Kind::Subject {
                continue;
            }
            let (subject_idx, object_idx) = if entries[j].kind == Kind::Subject { (j, i) } else { (i, j) };

            let veto_ratio = merge_veto_ratio(subject_idx, object_idx, &entries, other_category_boxes);
            let d = if veto_ratio >= MERGE_BOX_OVERLAP_AREA_RATIO {
                f64::INFINITY
            } else {
                fixed_distance(&entries[subject_idx].bbox, &entries[object_idx].bbox)
            };
            dis[i][j] = d;
            dis[j][i] = d;
        }
    }

    let mut used: HashSet<usize> = HashSet::new();
    let mut records = Vec::with_capacity(ns);

    for i in 0..ns {
        let seen = collect_group(i, n, &entries, &dis, &used);

        let mut object_body = None;
        if !seen.is_empty() {
            if let Some(winning) = partition_best_quadrant(i, &seen, &entries) {
                let boxes: Vec<Box> = winning.iter().map(|&idx| entries[idx].bbox).collect();
                if let Some(union) = Box::merge_all(boxes.iter()) {
                    object_body = Some(union);
                }
                used.extend(winning);
            }
        }

        let all_bbox = match object_body {
            Some(ob) => entries[i].bbox.merge(&ob),
            None => entries[i].bbox,
        };

        records.push(V1Record {
            subject_body: ScoredBox { bbox: entries[i].bbox, score: entries[i].score },
            object_body,
            all_bbox,
        });
    }

    records
}

/// Seed-and-expand candidate collection for subject `i` (spec §4.F step 3,
/// first two bullets). Returns the set of object indices (into `entries`)
/// bound to this subject before quadrant partitioning.
fn collect_group(i: usize, n: usize, entries: &[Entry], dis: &[Vec<f64>], used: &HashSet<usize>) -> HashSet<usize> {
    let mut arr: Vec<(f64, usize)> = Vec::new();
    for j in 0..n {
        if entries[j].kind != Kind::Object || used.contains(&j) || !dis[i][j].is_finite() {
            continue;
        }
        if single_axis(&entries[i].bbox, &entries[j].bbox).is_none() {
            continue;
        }
        let (left, right, _, _) = relative_pos(&entries[i].bbox, &entries[j].bbox);
        let one_way = if left || right {
            entries[i].bbox.width() as f64
        } else {
            entries[i].bbox.height() as f64
        };
        if dis[i][j] > one_way {
            continue;
        }
        arr.push((dis[i][j], j));
    }
    arr.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let mut seen: HashSet<usize> = HashSet::new();
    let Some(&(d0, j0)) = arr.first() else {
        return seen;
    };
    if may_find_other_nearest(i, j0, entries, dis) >= d0 {
        seen.insert(j0);
    } else {
        return seen;
    }

    loop {
        let frontier: Vec<usize> = seen.iter().copied().collect();
        let mut added = false;

        for &j in &frontier {
            for k in 0..n {
                if entries[k].kind != Kind::Object || used.contains(&k) || seen.contains(&k) {
                    continue;
                }
                if single_axis(&entries[j].bbox, &entries[k].bbox).is_none() {
                    continue;
                }
                if !dis[j][k].is_finite() || dis[j][k] > dis[i][j] {
                    continue;
                }

                let is_nearest = (0..n).all(|ni| {
                    if ni == j || ni == k || used.contains(&ni) || seen.contains(&ni) {
                        true
                    } else {
                        float_gt(dis[ni][k], dis[j][k])
                    }
                });
                if !is_nearest {
                    continue;
                }

                let expanded_boxes: Vec<Box> = seen.iter().chain(std::iter::once(&k)).map(|&idx| entries[idx].bbox).collect();
                let expanded = Box::merge_all(expanded_boxes.iter()).expect("non-empty");
                let n_dis = bbox_distance(&entries[i].bbox, &expanded);
                if float_gt(dis[i][j], n_dis) {
                    continue;
                }

                seen.insert(k);
                added = true;
            }
        }

        if !added {
            break;
        }
    }

    seen
}

fn single_axis(b1: &Box, b2: &Box) -> Option<(bool, bool, bool, bool)> {
    let flags = relative_pos(b1, b2);
    let (left, right, bottom, top) = flags;
    if [left, right, bottom, top].iter().filter(|f| **f).count() > 1 {
        None
    } else {
        Some(flags)
    }
}

fn merge_veto_ratio(subject_idx: usize, object_idx: usize, entries: &[Entry], other_category_boxes: &[Box]) -> f64 {
    let merged = entries[subject_idx].bbox.merge(&entries[object_idx].bbox);
    let obj_area = area(&entries[object_idx].bbox) as f64;
    let mut ratio = 0.0;
    for other in other_category_boxes {
        ratio = ratio.max(overlap_area(&merged, other) as f64 / obj_area);
        if ratio >= MERGE_BOX_OVERLAP_AREA_RATIO {
            break;
        }
    }
    ratio
}

/// `may_find_other_nearest_bbox`: is there another same-category-as-subject
/// entry, at least as large as the object, whose own distance to the object
/// beats the candidate distance? If so the candidate is reaching across that
/// subject and should be rejected by the caller.
fn may_find_other_nearest(subject_idx: usize, object_idx: usize, entries: &[Entry], dis: &[Vec<f64>]) -> f64 {
    let merged = entries[subject_idx].bbox.merge(&entries[object_idx].bbox);
    let object_area = area(&entries[object_idx].bbox) as f64;
    let mut ret = f64::INFINITY;
    for (k, e) in entries.iter().enumerate() {
        if k == subject_idx || e.kind != Kind::Subject {
            continue;
        }
        if is_part_overlap(&merged, &e.bbox) || is_in(&e.bbox, &merged) {
            let k_area = area(&e.bbox) as f64;
            if k_area >= object_area {
                ret = ret.min(dis[k][object_idx]);
            }
        }
    }
    ret
}

/// Quadrant partition (spec §4.F step 3, third bullet): of the four strips
/// around the subject carved out of the expanded seen-set bbox, keep the one
/// whose embedded objects cover the largest union area, and return just
/// those objects' indices.
fn partition_best_quadrant(i: usize, seen: &HashSet<usize>, entries: &[Entry]) -> Option<Vec<usize>> {
    let outer_boxes: Vec<Box> = seen.iter().chain(std::iter::once(&i)).map(|&idx| entries[idx].bbox).collect();
    let outer = Box::merge_all(outer_boxes.iter())?;
    let inner = entries[i].bbox;

    let quadrants = [
        Box::new(outer.x0, outer.y0, inner.x0, outer.y1), // left
        Box::new(outer.x0, outer.y0, outer.x1, inner.y0), // above
        Box::new(outer.x0, inner.y1, outer.x1, outer.y1), // below
        Box::new(inner.x1, outer.y0, outer.x1, outer.y1), // right
    ];

    let mut best_idx = None;
    let mut best_area: i64 = 0;
    for (qi, quadrant) in quadrants.iter().enumerate() {
        let embedded: Vec<usize> = seen
            .iter()
            .copied()
            .filter(|&idx| embed_ratio(&entries[idx].bbox, quadrant) > CAPTION_OVERLAP_AREA_RATIO)
            .collect();
        if embedded.is_empty() {
            continue;
        }
        let boxes: Vec<Box> = embedded.iter().map(|&idx| entries[idx].bbox).collect();
        let union = Box::merge_all(boxes.iter())?;
        let union_area = area(&union);
        if union_area > best_area {
            best_area = union_area;
            best_idx = Some(qi);
        }
    }

    let winning_quadrant = &quadrants[best_idx?];
    let winners: Vec<usize> = seen
        .iter()
        .copied()
        .filter(|&idx| embed_ratio(&entries[idx].bbox, winning_quadrant) > CAPTION_OVERLAP_AREA_RATIO)
        .collect();
    if winners.is_empty() {
        None
    } else {
        Some(winners)
    }
}

/// Overlap of `candidate` with `region`, as a fraction of `candidate`'s own
/// area (`calculate_overlap_area_in_bbox1_area_ratio`).
fn embed_ratio(candidate: &Box, region: &Box) -> f64 {
    let candidate_area = area(candidate) as f64;
    if candidate_area <= 0.0 {
        return 0.0;
    }
    overlap_area(candidate, region) as f64 / candidate_area
}

fn sort_key(b: &Box) -> i64 {
    let x0 = b.x0 as i64;
    let y0 = b.y0 as i64;
    x0 * x0 + y0 * y0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sb(x0: i32, y0: i32, x1: i32, y1: i32, score: f64) -> ScoredBox {
        ScoredBox { bbox: Box::new(x0, y0, x1, y1), score }
    }

    #[test]
    fn single_subject_single_object_pairs() {
        let subjects = vec![sb(100, 100, 300, 300, 0.9)];
        let objects = vec![sb(100, 310, 300, 340, 0.9)];
        let records = group(&subjects, &objects, &[]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].object_body, Some(Box::new(100, 310, 300, 340)));
        assert_eq!(records[0].all_bbox, Box::new(100, 100, 300, 340));
    }

    #[test]
    fn subject_with_no_nearby_object_has_no_object_body() {
        let subjects = vec![sb(0, 0, 100, 100, 0.9)];
        let objects = vec![sb(10_000, 10_000, 10_100, 10_100, 0.9)];
        let records = group(&subjects, &objects, &[]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].object_body, None);
        assert_eq!(records[0].all_bbox, Box::new(0, 0, 100, 100));
    }

    #[test]
    fn foreign_detection_vetoes_merge_reach() {
        let subjects = vec![sb(0, 0, 100, 100, 0.9)];
        let objects = vec![sb(0, 110, 100, 140, 0.9)];
        // a foreign block sitting inside the merged bbox, covering most of
        // the object's own area, should veto the pairing.
        let foreign = vec![Box::new(0, 105, 100, 145)];
        let records = group(&subjects, &objects, &foreign);
        assert_eq!(records[0].object_body, None);
    }
}
