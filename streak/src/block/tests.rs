use glam::UVec2;

use super::*;

fn axis_4() -> TimeAxis {
    TimeAxis::new(0.0, 1.0, 4).unwrap()
}

fn block_at(offset: (u32, u32), size: (u32, u32), filter: Option<TemporalFilter>) -> StreakBlock {
    StreakBlock::new(
        PixelRect::new(UVec2::new(offset.0, offset.1), UVec2::new(size.0, size.1)),
        axis_4(),
        filter.map(Arc::new),
    )
}

#[test]
fn test_nearest_bin_accumulation() {
    let mut block = block_at((0, 0), (2, 2), None);
    assert!(block.accumulate(1, 0, 2.5, 3.0, 0.5));

    let cell = block.cell(1, 0, 2).unwrap();
    assert!((cell.value - 1.5).abs() < f32::EPSILON);
    assert!((cell.weight - 0.5).abs() < f32::EPSILON);
    assert_eq!(block.cell(1, 0, 1).unwrap(), Cell::EMPTY);
    assert_eq!(block.samples(), 1);
}

#[test]
fn test_rejects_pixels_outside_rect() {
    let mut block = block_at((4, 4), (2, 2), None);
    assert!(!block.accumulate(3, 4, 0.5, 1.0, 1.0));
    assert!(!block.accumulate(6, 5, 0.5, 1.0, 1.0));
    assert!(!block.accumulate(-1, -1, 0.5, 1.0, 1.0));
    assert!(block.accumulate(5, 5, 0.5, 1.0, 1.0));
    assert_eq!(block.samples(), 1);
}

#[test]
fn test_drops_out_of_range_opl() {
    let mut block = block_at((0, 0), (1, 1), None);
    assert!(!block.accumulate(0, 0, -0.01, 1.0, 1.0));
    assert!(!block.accumulate(0, 0, 4.0, 1.0, 1.0));
    assert!(!block.accumulate(0, 0, f32::NAN, 1.0, 1.0));
    assert_eq!(block.samples(), 0);
    assert_eq!(block.total_weight(), 0.0);
}

#[test]
fn test_drops_out_of_range_opl_with_filter() {
    let mut block = block_at((0, 0), (1, 1), Some(TemporalFilter::tent(2.0).unwrap()));
    // Filter support would reach into the axis, but the sample itself is outside.
    assert!(!block.accumulate(0, 0, -0.5, 1.0, 1.0));
    assert!(!block.accumulate(0, 0, 4.5, 1.0, 1.0));
    assert_eq!(block.total_weight(), 0.0);
}

#[test]
fn test_drops_non_finite_inputs() {
    let mut block = block_at((0, 0), (1, 1), None);
    assert!(!block.accumulate(0, 0, 0.5, f32::INFINITY, 1.0));
    assert!(!block.accumulate(0, 0, 0.5, 1.0, f32::NAN));
    assert_eq!(block.samples(), 0);
}

#[test]
fn test_filtered_accumulation_conserves_weight() {
    let mut block = block_at((0, 0), (1, 1), Some(TemporalFilter::tent(1.5).unwrap()));
    assert!(block.accumulate(0, 0, 1.7, 2.0, 0.8));

    // Centers 0.5, 1.5 and 2.5 are within 1.5 bins of coordinate 1.7.
    let touched: Vec<Cell> = (0..4).map(|b| block.cell(0, 0, b).unwrap()).collect();
    assert!(touched[0].weight > 0.0);
    assert!(touched[1].weight > touched[2].weight);
    assert!(touched[2].weight > 0.0);
    assert_eq!(touched[3], Cell::EMPTY);

    let weight_sum: f32 = touched.iter().map(|c| c.weight).sum();
    assert!((weight_sum - 0.8).abs() < 1e-6);

    // Every touched cell keeps the sample's value as its weighted mean.
    for cell in touched.iter().take(3) {
        assert!((cell.mean() - 2.0).abs() < 1e-5);
    }
}

#[test]
fn test_filtered_accumulation_clipped_at_axis_edge() {
    let mut block = block_at((0, 0), (1, 1), Some(TemporalFilter::gaussian(0.5).unwrap()));
    assert!(block.accumulate(0, 0, 0.1, 1.0, 1.0));
    assert!((block.total_weight() - 1.0).abs() < 1e-6);
}

#[test]
fn test_filter_with_empty_support_falls_back_to_nearest() {
    let mut block = block_at((0, 0), (1, 1), Some(TemporalFilter::tent(0.25).unwrap()));
    // Coordinate 1.0 is 0.5 away from both neighbouring bin centers.
    assert!(block.accumulate(0, 0, 1.0, 5.0, 1.0));
    assert_eq!(
        block.cell(0, 0, 1).unwrap(),
        Cell {
            value: 5.0,
            weight: 1.0
        }
    );
}

#[test]
fn test_raw_ignores_filter() {
    let mut block = block_at((0, 0), (1, 1), Some(TemporalFilter::tent(2.0).unwrap()));
    assert!(block.accumulate_raw(0, 0, 1.2, 4.0, 1.0));
    assert_eq!(block.cell(0, 0, 0).unwrap(), Cell::EMPTY);
    assert_eq!(
        block.cell(0, 0, 1).unwrap(),
        Cell {
            value: 4.0,
            weight: 1.0
        }
    );
}

#[test]
fn test_accumulate_samples() {
    let mut block = block_at((0, 0), (1, 1), None);
    let samples = [
        RadianceSample::new(0.5, 1.0),
        RadianceSample::new(3.5, 2.0),
        RadianceSample::new(9.0, 3.0),
    ];
    assert_eq!(block.accumulate_samples(0, 0, &samples, 1.0), 2);
    assert_eq!(block.cell(0, 0, 3).unwrap().value, 2.0);
}

#[test]
fn test_clear_and_reset() {
    let mut block = block_at((0, 0), (2, 2), None);
    block.accumulate(0, 0, 0.5, 1.0, 1.0);
    block.clear();
    assert_eq!(block.samples(), 0);
    assert_eq!(block.total_weight(), 0.0);

    block.reset(PixelRect::new(UVec2::new(10, 10), UVec2::new(2, 2)));
    assert!(block.accumulate(11, 11, 0.5, 1.0, 1.0));
    assert!(!block.accumulate(0, 0, 0.5, 1.0, 1.0));

    block.reset(PixelRect::new(UVec2::new(0, 0), UVec2::new(3, 1)));
    assert_eq!(block.samples(), 0);
    assert!(block.accumulate(2, 0, 0.5, 1.0, 1.0));
    assert_eq!(block.row(0).len(), 3 * 4);
}

#[test]
fn test_cell_lookup_out_of_bounds() {
    let block = block_at((2, 2), (2, 2), None);
    assert_eq!(block.cell(0, 0, 0), None);
    assert_eq!(block.cell(2, 2, 4), None);
    assert_eq!(block.cell(3, 3, 3), Some(Cell::EMPTY));
}
