use pressmon_core::{LayoutTuning, SpatialSorter};
use pressmon_traits::BoundingBox;
use rstest::rstest;

const TL: usize = 0;
const TR: usize = 1;
const BL: usize = 2;
const BR: usize = 3;

fn grid() -> [BoundingBox; 4] {
    [
        BoundingBox::from_rect(10.0, 10.0, 60.0, 30.0),
        BoundingBox::from_rect(130.0, 12.0, 60.0, 30.0),
        BoundingBox::from_rect(8.0, 90.0, 60.0, 30.0),
        BoundingBox::from_rect(128.0, 88.0, 60.0, 30.0),
    ]
}

#[rstest]
#[case([TL, TR, BL, BR])]
#[case([BR, BL, TR, TL])]
#[case([BL, TR, BR, TL])]
#[case([TR, BR, TL, BL])]
fn two_by_two_grid_reads_row_major(#[case] input_order: [usize; 4]) {
    let g = grid();
    let boxes: Vec<BoundingBox> = input_order.iter().map(|&i| g[i]).collect();
    let order = SpatialSorter::default().order(&boxes);
    let labels: Vec<usize> = order.into_iter().map(|i| input_order[i]).collect();
    assert_eq!(labels, vec![TL, TR, BL, BR]);
}

#[test]
fn slight_vertical_jitter_stays_in_one_row() {
    // 30 px high boxes, row tolerance 18 px
    let boxes = [
        BoundingBox::from_rect(200.0, 14.0, 60.0, 30.0),
        BoundingBox::from_rect(0.0, 0.0, 60.0, 30.0),
        BoundingBox::from_rect(100.0, 10.0, 60.0, 30.0),
    ];
    assert_eq!(SpatialSorter::default().order(&boxes), vec![1, 2, 0]);
}

#[test]
fn boxes_split_across_one_column_are_read_top_down() {
    // Two fragments of one reading stacked within the same row band.
    let boxes = [
        BoundingBox::from_rect(0.0, 12.0, 60.0, 30.0),
        BoundingBox::from_rect(5.0, 0.0, 60.0, 30.0),
        BoundingBox::from_rect(200.0, 5.0, 60.0, 30.0),
    ];
    assert_eq!(SpatialSorter::default().order(&boxes), vec![1, 0, 2]);
}

#[test]
fn tighter_row_tuning_splits_rows() {
    // Upper box on the right, lower box 10 px further down on the left.
    let boxes = [
        BoundingBox::from_rect(100.0, 0.0, 60.0, 30.0),
        BoundingBox::from_rect(0.0, 10.0, 60.0, 30.0),
    ];
    // Default tolerance 18 px: one row, read left to right.
    assert_eq!(SpatialSorter::default().order(&boxes), vec![1, 0]);

    let tight = SpatialSorter::new(LayoutTuning {
        row_factor: 0.1,
        ..LayoutTuning::default()
    });
    // 3 px tolerance: two rows, upper first.
    assert_eq!(tight.order(&boxes), vec![0, 1]);
}

#[test]
fn equal_coordinates_keep_input_order() {
    let b = BoundingBox::from_rect(0.0, 0.0, 60.0, 30.0);
    assert_eq!(SpatialSorter::default().order(&[b, b, b]), vec![0, 1, 2]);
}
