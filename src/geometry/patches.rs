use crate::geometry::{DikeGeometry, SegmentationGrid};

/// Centre of one rectangular patch of the dike
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Patch {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

/// Split the dike into `n_length * n_width` rectangular patches
///
/// The order is load bearing: the opening vector and the columns of the Green's
/// matrix are aligned with it.
/// Rows are taken from the top of the dike downwards, and within the same row
/// patches run from left to right along strike.
///
/// # Arguments
/// * `geometry` - the whole dike
/// * `grid` - number of patches along the length and width
///
/// # Returns
/// * `Vec<Patch>` - patch centres, `n_length * n_width` long
///
/// # Examples
/// ```
/// use segdike_rs::geometry::{DikeGeometry, Patch, SegmentationGrid, patches};
///
/// let geometry: DikeGeometry = DikeGeometry::new(0.0, 0.0, 1000.0, 2000.0, 1000.0, 0.0);
/// let grid: SegmentationGrid = SegmentationGrid::new(2, 1).unwrap();
///
/// let dike_patches: Vec<Patch> = patches(&geometry, &grid);
/// assert_eq!(dike_patches.len(), 2);
/// assert_eq!(dike_patches[0].y, -500.0);
/// assert_eq!(dike_patches[1].y, 500.0);
/// ```
///
pub fn patches(geometry: &DikeGeometry, grid: &SegmentationGrid) -> Vec<Patch> {
    let n_length: usize = grid.n_length();
    let n_width: usize = grid.n_width();

    let strike_rad: f64 = geometry.strike.to_radians();
    let (sin_strike, cos_strike): (f64, f64) = strike_rad.sin_cos();

    let patch_length: f64 = geometry.length / n_length as f64;
    let patch_width: f64 = geometry.width / n_width as f64;

    let mut dike_patches: Vec<Patch> = Vec::with_capacity(grid.n_patches());
    // Rows, width direction
    for i_width in 0..n_width {
        let patch_depth: f64 = geometry.depth - geometry.width / 2.0 + (i_width as f64 + 0.5) * patch_width;

        // Columns, length direction
        for i_length in 0..n_length {
            // Signed distance from the dike centre, along strike
            let u: f64 = -geometry.length / 2.0 + (i_length as f64 + 0.5) * patch_length;

            dike_patches.push(Patch {
                x: geometry.xcen + u * sin_strike,
                y: geometry.ycen + u * cos_strike,
                depth: patch_depth,
            });
        }
    }

    return dike_patches;
}

#[test]
fn test_patches_single_patch_is_whole_dike() {
    use approx::assert_abs_diff_eq;

    let geometry: DikeGeometry = DikeGeometry::new(123.4, -567.8, 2500.0, 3000.0, 1200.0, 37.0);
    let grid: SegmentationGrid = SegmentationGrid::new(1, 1).unwrap();

    let dike_patches: Vec<Patch> = patches(&geometry, &grid);

    assert_eq!(dike_patches.len(), 1);
    assert_abs_diff_eq!(dike_patches[0].x, geometry.xcen, epsilon = 1e-12);
    assert_abs_diff_eq!(dike_patches[0].y, geometry.ycen, epsilon = 1e-12);
    assert_abs_diff_eq!(dike_patches[0].depth, geometry.depth, epsilon = 1e-12);
}

#[test]
fn test_patches_north_striking_dike() {
    // strike = 0 puts every along-strike offset onto the north axis
    let geometry: DikeGeometry = DikeGeometry::new(0.0, 0.0, 1000.0, 2000.0, 1000.0, 0.0);
    let grid: SegmentationGrid = SegmentationGrid::new(2, 1).unwrap();

    let dike_patches: Vec<Patch> = patches(&geometry, &grid);

    assert_eq!(
        dike_patches,
        vec![
            Patch { x: 0.0, y: -500.0, depth: 1000.0 },
            Patch { x: 0.0, y: 500.0, depth: 1000.0 },
        ]
    );
}

#[test]
fn test_patches_east_striking_dike() {
    use approx::assert_abs_diff_eq;

    // strike = 90 puts every along-strike offset onto the east axis
    let geometry: DikeGeometry = DikeGeometry::new(10.0, 20.0, 1000.0, 2000.0, 1000.0, 90.0);
    let grid: SegmentationGrid = SegmentationGrid::new(2, 1).unwrap();

    let dike_patches: Vec<Patch> = patches(&geometry, &grid);

    let precision: f64 = 1e-9;
    assert_abs_diff_eq!(dike_patches[0].x, 10.0 - 500.0, epsilon = precision);
    assert_abs_diff_eq!(dike_patches[0].y, 20.0, epsilon = precision);
    assert_abs_diff_eq!(dike_patches[1].x, 10.0 + 500.0, epsilon = precision);
    assert_abs_diff_eq!(dike_patches[1].y, 20.0, epsilon = precision);
}

#[test]
fn test_patches_ordering_width_outer_length_inner() {
    use approx::assert_abs_diff_eq;

    let geometry: DikeGeometry = DikeGeometry::new(0.0, 0.0, 3000.0, 3000.0, 2000.0, 0.0);
    let grid: SegmentationGrid = SegmentationGrid::new(3, 2).unwrap();

    let dike_patches: Vec<Patch> = patches(&geometry, &grid);
    assert_eq!(dike_patches.len(), 6);

    // Top row first (shallowest), left to right along strike
    let expected: Vec<(f64, f64)> = vec![
        (-1000.0, 2500.0),
        (0.0, 2500.0),
        (1000.0, 2500.0),
        (-1000.0, 3500.0),
        (0.0, 3500.0),
        (1000.0, 3500.0),
    ];
    for (i_patch, (y_expected, depth_expected)) in expected.into_iter().enumerate() {
        assert_abs_diff_eq!(dike_patches[i_patch].x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dike_patches[i_patch].y, y_expected, epsilon = 1e-9);
        assert_abs_diff_eq!(dike_patches[i_patch].depth, depth_expected, epsilon = 1e-9);
    }
}

#[test]
fn test_patches_oblique_strike_stays_on_dike_axis() {
    use approx::assert_abs_diff_eq;

    let geometry: DikeGeometry = DikeGeometry::new(-250.0, 400.0, 5000.0, 8000.0, 3000.0, 30.0);
    let grid: SegmentationGrid = SegmentationGrid::new(4, 3).unwrap();

    let dike_patches: Vec<Patch> = patches(&geometry, &grid);
    assert_eq!(dike_patches.len(), 12);

    let strike_rad: f64 = 30.0_f64.to_radians();
    for dike_patch in &dike_patches {
        // Offsets from the centre are parallel to the strike direction (sin, cos)
        let d_x: f64 = dike_patch.x - geometry.xcen;
        let d_y: f64 = dike_patch.y - geometry.ycen;
        assert_abs_diff_eq!(d_x * strike_rad.cos() - d_y * strike_rad.sin(), 0.0, epsilon = 1e-9);
    }

    // Mean of the patch centres is the dike centre
    let n_patches: f64 = dike_patches.len() as f64;
    let x_mean: f64 = dike_patches.iter().map(|p| p.x).sum::<f64>() / n_patches;
    let y_mean: f64 = dike_patches.iter().map(|p| p.y).sum::<f64>() / n_patches;
    let depth_mean: f64 = dike_patches.iter().map(|p| p.depth).sum::<f64>() / n_patches;
    assert_abs_diff_eq!(x_mean, geometry.xcen, epsilon = 1e-9);
    assert_abs_diff_eq!(y_mean, geometry.ycen, epsilon = 1e-9);
    assert_abs_diff_eq!(depth_mean, geometry.depth, epsilon = 1e-9);
}
