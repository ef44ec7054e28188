//! Reading-order sorting for OCR boxes.
//!
//! Boxes are grouped into rows by centre Y and into columns by centre X,
//! each against the running mean of the group being built. Group
//! tolerances scale with the upper-median box size, so the same code works
//! whether the display fills the frame or a corner of it.

use pressmon_traits::BoundingBox;

use crate::util::{mean, upper_median};

/// Tolerances as fractions of the median box size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutTuning {
    /// Same-row tolerance as a fraction of the median box height.
    pub row_factor: f64,
    /// Same-column tolerance as a fraction of the median box width.
    pub col_factor: f64,
}

impl Default for LayoutTuning {
    fn default() -> Self {
        Self {
            row_factor: 0.6,
            col_factor: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialSorter {
    tuning: LayoutTuning,
}

#[derive(Debug, Clone, Copy)]
struct Centre {
    x: f64,
    y: f64,
    index: usize,
}

/// Split `points` (already ordered along `key`) wherever a point strays
/// more than `threshold` from the mean of the group being built.
fn group_by(points: Vec<Centre>, threshold: f64, key: fn(&Centre) -> f64) -> Vec<Vec<Centre>> {
    let mut groups: Vec<Vec<Centre>> = Vec::new();
    let mut current: Vec<Centre> = Vec::new();
    let mut keys: Vec<f64> = Vec::new();
    for p in points {
        if !current.is_empty() && (key(&p) - mean(&keys)).abs() > threshold {
            groups.push(std::mem::take(&mut current));
            keys.clear();
        }
        keys.push(key(&p));
        current.push(p);
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

impl SpatialSorter {
    pub fn new(tuning: LayoutTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> LayoutTuning {
        self.tuning
    }

    /// Indices of `boxes` in reading order.
    pub fn order(&self, boxes: &[BoundingBox]) -> Vec<usize> {
        let Some(median_h) = upper_median(boxes.iter().map(BoundingBox::height).collect()) else {
            return Vec::new();
        };
        let median_w = upper_median(boxes.iter().map(BoundingBox::width).collect()).unwrap_or(0.0);
        let row_threshold = median_h * self.tuning.row_factor;
        let col_threshold = median_w * self.tuning.col_factor;

        let mut centres: Vec<Centre> = boxes
            .iter()
            .enumerate()
            .map(|(index, b)| {
                let c = b.center();
                Centre { x: c.x, y: c.y, index }
            })
            .collect();
        // stable: equal coordinates keep input order
        centres.sort_by(|a, b| a.y.total_cmp(&b.y));

        let mut out = Vec::with_capacity(boxes.len());
        for mut row in group_by(centres, row_threshold, |c| c.y) {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            for mut column in group_by(row, col_threshold, |c| c.x) {
                column.sort_by(|a, b| a.y.total_cmp(&b.y));
                out.extend(column.iter().map(|c| c.index));
            }
        }
        out
    }

    /// Reorder `(box, value)` pairs into reading order.
    pub fn sort<T>(&self, items: Vec<(BoundingBox, T)>) -> Vec<(BoundingBox, T)> {
        let boxes: Vec<BoundingBox> = items.iter().map(|(b, _)| *b).collect();
        let order = self.order(&boxes);
        let mut slots: Vec<Option<(BoundingBox, T)>> = items.into_iter().map(Some).collect();
        order.into_iter().filter_map(|i| slots[i].take()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_sorts_to_nothing() {
        assert!(SpatialSorter::default().order(&[]).is_empty());
    }

    #[test]
    fn stacked_boxes_in_one_column_read_top_down() {
        // Two rows of one column each, plus a slightly lower box in the
        // top row that still belongs to it.
        let boxes = [
            BoundingBox::from_rect(0.0, 100.0, 50.0, 20.0),
            BoundingBox::from_rect(0.0, 0.0, 50.0, 20.0),
            BoundingBox::from_rect(100.0, 5.0, 50.0, 20.0),
        ];
        assert_eq!(SpatialSorter::default().order(&boxes), vec![1, 2, 0]);
    }

    #[test]
    fn sort_carries_payloads() {
        let items = vec![
            (BoundingBox::from_rect(100.0, 0.0, 50.0, 20.0), "right"),
            (BoundingBox::from_rect(0.0, 0.0, 50.0, 20.0), "left"),
        ];
        let sorted = SpatialSorter::default().sort(items);
        let names: Vec<_> = sorted.iter().map(|(_, n)| *n).collect();
        assert_eq!(names, ["left", "right"]);
    }
}
