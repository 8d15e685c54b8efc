//! Box arithmetic (spec §4.A). Every comparison that gates group membership
//! downstream goes through [`float_gt`] rather than native `>`, per §5.

use crate::entities::Box;

/// Tolerance used by [`float_gt`] and anywhere a strict-greater comparison
/// must be reproducible across platforms (spec §6.4 `FLOAT_EPS`).
pub const FLOAT_EPS: f64 = 1e-6;

/// `a > b` with tolerance, so that near-ties don't flip membership decisions
/// due to floating point noise.
#[inline]
pub fn float_gt(a: f64, b: f64) -> bool {
    a > b + FLOAT_EPS
}

#[inline]
pub fn area(b: &Box) -> i64 {
    b.width().max(0) as i64 * b.height().max(0) as i64
}

fn overlap_x(a: &Box, b: &Box) -> i64 {
    (a.x1.min(b.x1) as i64 - a.x0.max(b.x0) as i64).max(0)
}

fn overlap_y(a: &Box, b: &Box) -> i64 {
    (a.y1.min(b.y1) as i64 - a.y0.max(b.y0) as i64).max(0)
}

#[inline]
pub fn overlap_area(a: &Box, b: &Box) -> i64 {
    overlap_x(a, b) * overlap_y(a, b)
}

/// Intersection over union; `0.0` when the union is empty (two degenerate
/// boxes) rather than `NaN`.
pub fn iou(a: &Box, b: &Box) -> f64 {
    let inter = overlap_area(a, b);
    let union = area(a) + area(b) - inter;
    if union <= 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// `a` fully contained in `b`, inclusive edges.
pub fn is_in(a: &Box, b: &Box) -> bool {
    a.x0 >= b.x0 && a.y0 >= b.y0 && a.x1 <= b.x1 && a.y1 <= b.y1
}

/// `a` and `b` overlap but neither contains the other.
pub fn is_part_overlap(a: &Box, b: &Box) -> bool {
    overlap_area(a, b) > 0 && !is_in(a, b) && !is_in(b, a)
}

/// Four flags telling whether `b2` lies strictly to that side of `b1`
/// (axis-separation test). At most one pair (`left`/`right` xor
/// `top`/`bottom`) can be simultaneously meaningful for a well-formed
/// "clearly on one side" relationship; when the boxes are diagonally
/// arranged more than one flag can be true at once, which callers use to
/// detect and reject that case.
pub fn relative_pos(b1: &Box, b2: &Box) -> (bool, bool, bool, bool) {
    let left = b2.x1 <= b1.x0;
    let right = b2.x0 >= b1.x1;
    let bottom = b2.y0 >= b1.y1;
    let top = b2.y1 <= b1.y0;
    (left, right, bottom, top)
}

/// Edge-to-edge Euclidean distance; `0.0` when the boxes overlap or touch on
/// both axes.
pub fn bbox_distance(b1: &Box, b2: &Box) -> f64 {
    let gap_x = (b1.x0.max(b2.x0) as f64 - b1.x1.min(b2.x1) as f64).max(0.0);
    let gap_y = (b1.y0.max(b2.y0) as f64 - b1.y1.min(b2.y1) as f64).max(0.0);
    (gap_x * gap_x + gap_y * gap_y).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(x0: i32, y0: i32, x1: i32, y1: i32) -> Box {
        Box::new(x0, y0, x1, y1)
    }

    #[test]
    fn iou_self_is_one() {
        let a = b(0, 0, 10, 10);
        assert_eq!(iou(&a, &a), 1.0);
    }

    #[test]
    fn iou_disjoint_is_zero() {
        let a = b(0, 0, 10, 10);
        let c = b(20, 20, 30, 30);
        assert_eq!(iou(&a, &c), 0.0);
    }

    #[test]
    fn iou_partial_overlap() {
        let a = b(0, 0, 10, 10);
        let c = b(5, 5, 15, 15);
        // intersection 5x5=25, union 100+100-25=175
        assert!((iou(&a, &c) - 25.0 / 175.0).abs() < 1e-9);
    }

    #[test]
    fn containment_inclusive_edges() {
        let outer = b(0, 0, 10, 10);
        let inner = b(0, 0, 10, 10);
        assert!(is_in(&inner, &outer));
        let inner2 = b(2, 2, 8, 8);
        assert!(is_in(&inner2, &outer));
        let escaping = b(2, 2, 11, 8);
        assert!(!is_in(&escaping, &outer));
    }

    #[test]
    fn part_overlap_excludes_containment() {
        let a = b(0, 0, 10, 10);
        let c = b(5, 5, 20, 20);
        assert!(is_part_overlap(&a, &c));
        let inner = b(2, 2, 8, 8);
        assert!(!is_part_overlap(&inner, &a));
    }

    #[test]
    fn relative_pos_strict_sides() {
        let a = b(10, 10, 20, 20);
        let left_of_a = b(0, 10, 5, 20);
        let (left, right, bottom, top) = relative_pos(&a, &left_of_a);
        assert!(left && !right && !bottom && !top);

        let below_a = b(10, 25, 20, 30);
        let (left, right, bottom, top) = relative_pos(&a, &below_a);
        assert!(bottom && !left && !right && !top);
    }

    #[test]
    fn relative_pos_diagonal_sets_two_flags() {
        let a = b(10, 10, 20, 20);
        let diagonal = b(25, 25, 30, 30); // below AND right
        let (left, right, bottom, top) = relative_pos(&a, &diagonal);
        assert!(right && bottom && !left && !top);
    }

    #[test]
    fn bbox_distance_is_symmetric_and_zero_on_touch() {
        let a = b(0, 0, 10, 10);
        let c = b(10, 0, 20, 10); // touching edge
        assert_eq!(bbox_distance(&a, &c), 0.0);
        assert_eq!(bbox_distance(&a, &c), bbox_distance(&c, &a));

        let d = b(13, 4, 17, 6);
        let dist = bbox_distance(&a, &d);
        assert_eq!(dist, 3.0);
        assert_eq!(bbox_distance(&a, &d), bbox_distance(&d, &a));
    }

    #[test]
    fn float_gt_respects_epsilon() {
        assert!(!float_gt(1.0000001, 1.0));
        assert!(float_gt(1.1, 1.0));
    }
}
