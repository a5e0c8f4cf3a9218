use crate::errors::Error;
use crate::geometry::{DikeGeometry, Patch, SegmentationGrid, patches};
use crate::observations::ObservationSet;
use crate::okada::{DislocationSolver, DislocationType, Okada};
use log::debug;
use ndarray::{Array1, Array2, s};
use std::time::{Duration, Instant};

/// Dikes are vertical
pub const DIKE_DIP: f64 = 90.0;

const UNIT_OPENING: f64 = 1.0;

/// Green's table between the dike patches and the stations
///
/// Column `i_patch` is the displacement caused by a unit opening of patch `i_patch`,
/// with every other patch closed. Rows are stacked as `[u_x(0..n), u_y(0..n), u_z(0..n)]`.
/// Patches are ordered as returned by [`patches`].
///
/// The solver must already be bound to the stations and set to tensile dislocations.
///
/// # Arguments
/// * `geometry` - the whole dike
/// * `grid` - number of patches along the length and width
/// * `solver` - rectangular dislocation evaluated at the stations
///
/// # Returns
/// * `g[(i_row, i_patch)]` - shape = `(3 * n_stations, n_length * n_width)`
///
pub fn greens_dike(geometry: &DikeGeometry, grid: &SegmentationGrid, solver: &dyn DislocationSolver) -> Result<Array2<f64>, Error> {
    let timing_start: Instant = Instant::now();

    let n_rows: usize = 3 * solver.n_observations();
    let n_patches: usize = grid.n_patches();

    // Whole dike with unit opening, used to check the solver returns the expected shape
    // before paying for the patch loop
    let reference: Array1<f64> = solver.forward(&[
        geometry.xcen,
        geometry.ycen,
        geometry.depth,
        geometry.length,
        geometry.width,
        UNIT_OPENING,
        geometry.strike,
        DIKE_DIP,
    ])?;
    if reference.len() != n_rows {
        return Err(Error::shape_mismatch("whole dike response", n_rows, reference.len()));
    }

    let patch_length: f64 = geometry.length / grid.n_length() as f64;
    let patch_width: f64 = geometry.width / grid.n_width() as f64;
    let dike_patches: Vec<Patch> = patches(geometry, grid);

    let mut g: Array2<f64> = Array2::from_elem((n_rows, n_patches), f64::NAN);
    for (i_patch, patch) in dike_patches.iter().enumerate() {
        let displacement: Array1<f64> = solver.forward(&[
            patch.x,
            patch.y,
            patch.depth,
            patch_length,
            patch_width,
            UNIT_OPENING,
            geometry.strike,
            DIKE_DIP,
        ])?;
        if displacement.len() != n_rows {
            return Err(Error::shape_mismatch(format!("patch {i_patch} response"), n_rows, displacement.len()));
        }

        g.slice_mut(s![.., i_patch]).assign(&displacement);
    }

    let duration: Duration = timing_start.elapsed();
    debug!("greens_dike: n_patches={}, n_rows={}, time elapsed: {:?}", n_patches, n_rows, duration);

    return Ok(g);
}

/// Same as [`greens_dike`], binding a tensile Okada solver to the stations first
pub fn greens_dike_okada(geometry: &DikeGeometry, grid: &SegmentationGrid, observations: &ObservationSet) -> Result<Array2<f64>, Error> {
    // Only the coordinates are needed, the observed displacements are replaced with zeros
    let synthetic: ObservationSet = observations.to_synthetic();
    let okada: Okada = Okada::new(&synthetic).with_type(DislocationType::Tensile);

    return greens_dike(geometry, grid, &okada);
}

#[cfg(test)]
fn test_stations() -> ObservationSet {
    let xs: Array1<f64> = Array1::from(vec![-6000.0, -2500.0, -700.0, 350.0, 1800.0, 4200.0, 9000.0]);
    let ys: Array1<f64> = Array1::from(vec![1500.0, -3200.0, 600.0, -4100.0, 2700.0, -900.0, 300.0]);
    return ObservationSet::synthetic(xs, ys).unwrap();
}

#[test]
fn test_greens_dike_shape() {
    let observations: ObservationSet = test_stations();
    let geometry: DikeGeometry = DikeGeometry::new(200.0, -100.0, 3000.0, 4000.0, 2000.0, 25.0);
    let grid: SegmentationGrid = SegmentationGrid::new(4, 3).unwrap();

    let g: Array2<f64> = greens_dike_okada(&geometry, &grid, &observations).unwrap();

    assert_eq!(g.shape(), &[3 * 7, 12]);
    assert!(g.iter().all(|value: &f64| value.is_finite()));
}

#[test]
fn test_greens_dike_patches_add_up_to_whole_dike() {
    // The rectangular solution is a definite integral over the rectangle,
    // so patches tiling the dike must add up to the whole dike
    use approx::assert_abs_diff_eq;
    use ndarray::Axis;

    let observations: ObservationSet = test_stations();
    let okada: Okada = Okada::new(&observations).with_type(DislocationType::Tensile);
    let geometry: DikeGeometry = DikeGeometry::new(200.0, -100.0, 3000.0, 4000.0, 2000.0, 25.0);
    let grid: SegmentationGrid = SegmentationGrid::new(5, 4).unwrap();

    let g: Array2<f64> = greens_dike(&geometry, &grid, &okada).unwrap();
    let sum_of_patches: Array1<f64> = g.sum_axis(Axis(1));

    let whole_dike: Array1<f64> = okada
        .forward(&[200.0, -100.0, 3000.0, 4000.0, 2000.0, 1.0, 25.0, 90.0])
        .unwrap();

    let precision: f64 = 1e-10;
    assert_abs_diff_eq!(sum_of_patches, whole_dike, epsilon = precision);
}

#[test]
fn test_greens_dike_single_patch_is_whole_dike() {
    use approx::assert_abs_diff_eq;

    let observations: ObservationSet = test_stations();
    let okada: Okada = Okada::new(&observations).with_type(DislocationType::Tensile);
    let geometry: DikeGeometry = DikeGeometry::new(0.0, 0.0, 2500.0, 3000.0, 1000.0, 0.0);
    let grid: SegmentationGrid = SegmentationGrid::default();

    let g: Array2<f64> = greens_dike(&geometry, &grid, &okada).unwrap();
    let whole_dike: Array1<f64> = okada.forward(&[0.0, 0.0, 2500.0, 3000.0, 1000.0, 1.0, 0.0, 90.0]).unwrap();

    assert_abs_diff_eq!(g.column(0), whole_dike.view(), epsilon = 1e-14);
}

#[cfg(test)]
struct RecordingSolver {
    n_observations: usize,
    n_rows_returned: usize,
    calls: std::cell::RefCell<Vec<Vec<f64>>>,
}

#[cfg(test)]
impl DislocationSolver for RecordingSolver {
    fn forward(&self, parameters: &[f64]) -> Result<Array1<f64>, Error> {
        self.calls.borrow_mut().push(parameters.to_vec());
        // Encode the call number so the column order can be checked
        let i_call: f64 = self.calls.borrow().len() as f64;
        return Ok(Array1::from_elem(self.n_rows_returned, i_call));
    }

    fn n_observations(&self) -> usize {
        return self.n_observations;
    }
}

#[test]
fn test_greens_dike_calls_solver_in_patch_order() {
    let solver: RecordingSolver = RecordingSolver {
        n_observations: 2,
        n_rows_returned: 6,
        calls: std::cell::RefCell::new(Vec::new()),
    };
    let geometry: DikeGeometry = DikeGeometry::new(0.0, 0.0, 1000.0, 2000.0, 1000.0, 0.0);
    let grid: SegmentationGrid = SegmentationGrid::new(2, 2).unwrap();

    let g: Array2<f64> = greens_dike(&geometry, &grid, &solver).unwrap();

    // Reference call first, then one call per patch
    let calls: Vec<Vec<f64>> = solver.calls.borrow().clone();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[0], vec![0.0, 0.0, 1000.0, 2000.0, 1000.0, 1.0, 0.0, 90.0]);
    assert_eq!(calls[1], vec![0.0, -500.0, 750.0, 1000.0, 500.0, 1.0, 0.0, 90.0]);
    assert_eq!(calls[2], vec![0.0, 500.0, 750.0, 1000.0, 500.0, 1.0, 0.0, 90.0]);
    assert_eq!(calls[3], vec![0.0, -500.0, 1250.0, 1000.0, 500.0, 1.0, 0.0, 90.0]);
    assert_eq!(calls[4], vec![0.0, 500.0, 1250.0, 1000.0, 500.0, 1.0, 0.0, 90.0]);

    // Column i_patch holds the response of call i_patch + 2
    assert_eq!(g.shape(), &[6, 4]);
    for i_patch in 0..4 {
        assert!(g.column(i_patch).iter().all(|&value: &f64| value == (i_patch + 2) as f64));
    }
}

#[test]
fn test_greens_dike_rejects_wrong_solver_shape() {
    let solver: RecordingSolver = RecordingSolver {
        n_observations: 3,
        n_rows_returned: 8,
        calls: std::cell::RefCell::new(Vec::new()),
    };
    let geometry: DikeGeometry = DikeGeometry::new(0.0, 0.0, 1000.0, 2000.0, 1000.0, 0.0);
    let grid: SegmentationGrid = SegmentationGrid::new(3, 1).unwrap();

    let result: Result<Array2<f64>, Error> = greens_dike(&geometry, &grid, &solver);

    assert_eq!(result, Err(Error::shape_mismatch("whole dike response", 9, 8)));
    // Stops at the reference call
    assert_eq!(solver.calls.borrow().len(), 1);
}

#[test]
fn test_greens_dike_propagates_solver_failure() {
    let observations: ObservationSet = test_stations();
    let geometry: DikeGeometry = DikeGeometry::new(0.0, 0.0, 1000.0, 2000.0, 0.0, 0.0);
    let grid: SegmentationGrid = SegmentationGrid::new(2, 1).unwrap();

    let result: Result<Array2<f64>, Error> = greens_dike_okada(&geometry, &grid, &observations);

    assert!(matches!(result, Err(Error::SolverFailure { .. })));
}
