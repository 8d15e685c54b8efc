//! Overlap reducer (spec §4.D): drop any box fully contained in another,
//! preserving input order. Used to clean subject and object lists before
//! both groupers run.

use crate::entities::Box;
use crate::geometry::is_in;

/// Returns the indices (into `boxes`, in original order) that survive: those
/// not fully contained in any other entry.
pub fn keep_indices(boxes: &[Box]) -> Vec<usize> {
    (0..boxes.len())
        .filter(|&i| {
            !(0..boxes.len()).any(|j| j != i && is_in(&boxes[i], &boxes[j]))
        })
        .collect()
}

/// Convenience wrapper over owned items carrying a box, keeping the caller's
/// original order.
pub fn reduce<T>(items: Vec<T>, bbox: impl Fn(&T) -> Box) -> Vec<T> {
    let boxes: Vec<Box> = items.iter().map(&bbox).collect();
    let keep: Vec<usize> = keep_indices(&boxes);
    let mut items = items.into_iter().enumerate();
    keep.into_iter()
        .filter_map(|k| items.find(|(i, _)| *i == k).map(|(_, v)| v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_boxes_fully_contained_in_another() {
        let boxes = vec![
            Box::new(0, 0, 100, 100),
            Box::new(10, 10, 20, 20), // contained in [0]
            Box::new(200, 200, 300, 300),
        ];
        assert_eq!(keep_indices(&boxes), vec![0, 2]);
    }

    #[test]
    fn equal_boxes_mutually_contained_both_dropped() {
        // two identical boxes: each is "in" the other, so under a strict
        // reading both get dropped. Matches spec's literal containment test
        // with no special-casing for ties.
        let boxes = vec![Box::new(0, 0, 10, 10), Box::new(0, 0, 10, 10)];
        assert_eq!(keep_indices(&boxes), Vec::<usize>::new());
    }

    #[test]
    fn preserves_input_order() {
        let boxes = vec![
            Box::new(200, 200, 300, 300),
            Box::new(0, 0, 100, 100),
            Box::new(10, 10, 20, 20),
        ];
        assert_eq!(keep_indices(&boxes), vec![0, 1]);
    }

    #[test]
    fn no_overlap_keeps_all() {
        let boxes = vec![
            Box::new(0, 0, 10, 10),
            Box::new(20, 20, 30, 30),
            Box::new(40, 40, 50, 50),
        ];
        assert_eq!(keep_indices(&boxes), vec![0, 1, 2]);
    }
}
