use crate::bayesian_schedule::BayesianSchedule;
use crate::errors::Error;
use crate::geometry::{DikeGeometry, N_GEOMETRY_PARAMETERS, Patch, SegmentationGrid, patches};
use crate::greens::greens_dike;
use crate::observations::ObservationSet;
use crate::okada::{DislocationSolver, DislocationType, Okada};
use log::{debug, info};
use ndarray::{Array1, Array2, s};
use numpy::IntoPyArray;
use numpy::borrow::PyReadonlyArray1;
use numpy::{PyArray1, PyArray2, PyArrayMethods};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyTuple;
use std::sync::{Mutex, MutexGuard};

type Displacement = (Array1<f64>, Array1<f64>, Array1<f64>);

/// Last Green's table and the geometry it was computed for
struct GreensCache {
    geometry: DikeGeometry,
    g: Array2<f64>,
}

/// A vertical dike split into `n_length * n_width` rectangular patches, each with its own opening
///
/// Parameters, in order:
/// * `xcen`, `ycen` - centre of the dike
/// * `depth` - depth of the centre of the dike
/// * `length` - length of the dike (horizontal direction)
/// * `width` - width of the dike (vertical direction)
/// * `strike` - orientation of the dike, clockwise from north
/// * `open0`, `open1`, ... - opening of each patch, in the order returned by `get_patches`
#[pyclass]
pub struct SegmentedDike {
    grid: SegmentationGrid,
    observations: ObservationSet,
    solver: Box<dyn DislocationSolver + Send + Sync>,
    schedule: BayesianSchedule,
    use_cache: bool,
    greens_cache: Mutex<Option<GreensCache>>,
}

/// Python accessible methods
#[pymethods]
impl SegmentedDike {
    #[new]
    #[pyo3(signature = (xs, ys, ux=None, uy=None, uz=None, nl=None, nw=None, steps=None, burnin=None, thin=None, use_cache=true))]
    pub fn new(
        xs: PyReadonlyArray1<f64>,
        ys: PyReadonlyArray1<f64>,
        ux: Option<PyReadonlyArray1<f64>>,
        uy: Option<PyReadonlyArray1<f64>>,
        uz: Option<PyReadonlyArray1<f64>>,
        nl: Option<i64>,
        nw: Option<i64>,
        steps: Option<usize>,
        burnin: Option<usize>,
        thin: Option<usize>,
        use_cache: bool,
    ) -> PyResult<Self> {
        // Convert into Rust data types
        let xs_ndarray: Array1<f64> = xs.to_owned_array();
        let ys_ndarray: Array1<f64> = ys.to_owned_array();

        // Observed displacements are optional, zeros are used when only the stations are known
        let observations: ObservationSet = match (ux, uy, uz) {
            (Some(ux), Some(uy), Some(uz)) => {
                ObservationSet::new(xs_ndarray, ys_ndarray, ux.to_owned_array(), uy.to_owned_array(), uz.to_owned_array())?
            }
            (None, None, None) => ObservationSet::synthetic(xs_ndarray, ys_ndarray)?,
            _ => return Err(PyValueError::new_err("ux, uy and uz must be given together")),
        };

        // Signed so that a negative count is reported as a configuration error
        let grid: SegmentationGrid = SegmentationGrid::from_signed(nl.unwrap_or(1), nw.unwrap_or(1))?;

        let segmented_dike: SegmentedDike = SegmentedDike::from_observations(observations, grid)
            .with_schedule(BayesianSchedule::new(steps, burnin, thin))
            .with_cache(use_cache);

        return Ok(segmented_dike);
    }

    pub fn get_source_id(&self) -> &'static str {
        return self.source_id();
    }

    /// `(steps, burnin, thin)` for the sampler
    pub fn bayesian_steps(&self) -> (usize, usize, usize) {
        return (self.schedule.steps, self.schedule.burnin, self.schedule.thin);
    }

    pub fn time_dependent(&self) -> bool {
        return false;
    }

    #[getter]
    pub fn parameters(&self) -> Vec<String> {
        return self.parameter_names();
    }

    #[getter]
    pub fn nl(&self) -> usize {
        return self.grid.n_length();
    }

    #[getter]
    pub fn nw(&self) -> usize {
        return self.grid.n_width();
    }

    /// List of `(x, y, depth)` patch centres
    #[pyo3(name = "get_patches")]
    pub fn get_patches_py(&self, xcen: f64, ycen: f64, depth: f64, length: f64, width: f64, strike: f64) -> Vec<(f64, f64, f64)> {
        let geometry: DikeGeometry = DikeGeometry::new(xcen, ycen, depth, length, width, strike);
        return self.get_patches(&geometry).iter().map(|patch: &Patch| (patch.x, patch.y, patch.depth)).collect();
    }

    /// Green's table, shape = `(3 * n_stations, nl * nw)`
    #[pyo3(name = "get_greens")]
    pub fn get_greens_py(
        &self,
        py: Python,
        xcen: f64,
        ycen: f64,
        depth: f64,
        length: f64,
        width: f64,
        strike: f64,
    ) -> PyResult<Py<PyArray2<f64>>> {
        let geometry: DikeGeometry = DikeGeometry::new(xcen, ycen, depth, length, width, strike);
        let g: Array2<f64> = self.get_greens(&geometry)?;

        return Ok(g.into_pyarray(py).into());
    }

    /// `model(x, y, xcen, ycen, depth, length, width, strike, *openings) -> (ux, uy, uz)`
    #[pyo3(name = "model", signature = (x, y, xcen, ycen, depth, length, width, strike, *openings))]
    pub fn model_py(
        &self,
        py: Python,
        x: PyReadonlyArray1<f64>,
        y: PyReadonlyArray1<f64>,
        xcen: f64,
        ycen: f64,
        depth: f64,
        length: f64,
        width: f64,
        strike: f64,
        openings: &Bound<'_, PyTuple>,
    ) -> PyResult<(Py<PyArray1<f64>>, Py<PyArray1<f64>>, Py<PyArray1<f64>>)> {
        // Convert into Rust data types
        let x_ndarray: Array1<f64> = x.to_owned_array();
        let y_ndarray: Array1<f64> = y.to_owned_array();
        let openings_ndarray: Array1<f64> = Array1::from(openings.extract::<Vec<f64>>()?);

        let geometry: DikeGeometry = DikeGeometry::new(xcen, ycen, depth, length, width, strike);
        let (ux, uy, uz): Displacement = self.model(&x_ndarray, &y_ndarray, &geometry, &openings_ndarray)?;

        return Ok((ux.into_pyarray(py).into(), uy.into_pyarray(py).into(), uz.into_pyarray(py).into()));
    }

    /// Evaluate the flat parameter vector `[xcen, ycen, depth, length, width, strike, open0, ...]`
    /// at the stations the model was built with
    #[pyo3(name = "forward")]
    pub fn forward_py(&self, py: Python, parameters: PyReadonlyArray1<f64>) -> PyResult<(Py<PyArray1<f64>>, Py<PyArray1<f64>>, Py<PyArray1<f64>>)> {
        let parameters_vec: Vec<f64> = parameters.to_owned_array().to_vec();
        let (ux, uy, uz): Displacement = self.forward(&parameters_vec)?;

        return Ok((ux.into_pyarray(py).into(), uy.into_pyarray(py).into(), uz.into_pyarray(py).into()));
    }

    /// Observed minus modelled displacement at the bound stations, returns `(rx, ry, rz)`
    #[pyo3(name = "residuals")]
    pub fn residuals_py(&self, py: Python, parameters: PyReadonlyArray1<f64>) -> PyResult<(Py<PyArray1<f64>>, Py<PyArray1<f64>>, Py<PyArray1<f64>>)> {
        let parameters_vec: Vec<f64> = parameters.to_owned_array().to_vec();
        let (rx, ry, rz): Displacement = self.residuals(&parameters_vec)?;

        return Ok((rx.into_pyarray(py).into(), ry.into_pyarray(py).into(), rz.into_pyarray(py).into()));
    }

    /// Print to screen, to be used within Python
    fn __repr__(&self) -> String {
        let version: &str = env!("CARGO_PKG_VERSION");

        let mut string_output = String::from("╔═════════════════════════════════════════════════════════════════════════════╗\n");
        string_output += &format!("║  {:<74} ║\n", "<segdike_rs.SegmentedDike>");
        string_output += &format!("║  {:<74} ║\n", version);
        string_output += &format!("║  {:<74} ║\n", format!("nl = {}, nw = {}", self.grid.n_length(), self.grid.n_width()));
        string_output += &format!("║  {:<74} ║\n", format!("n_stations = {}", self.observations.n_stations()));

        string_output.push_str("╚═════════════════════════════════════════════════════════════════════════════╝");

        return string_output;
    }
}

/// Rust only methods
impl SegmentedDike {
    /// Model bound to `observations`, using a tensile Okada solver
    pub fn from_observations(observations: ObservationSet, grid: SegmentationGrid) -> Self {
        // Only the coordinates are needed by the solver
        let synthetic: ObservationSet = observations.to_synthetic();
        let okada: Okada = Okada::new(&synthetic).with_type(DislocationType::Tensile);

        info!(
            "SegmentedDike: n_stations={}, nl={}, nw={}",
            observations.n_stations(),
            grid.n_length(),
            grid.n_width()
        );

        return SegmentedDike {
            grid,
            observations,
            solver: Box::new(okada),
            schedule: BayesianSchedule::default(),
            use_cache: true,
            greens_cache: Mutex::new(None),
        };
    }

    /// Model bound to `observations` with any dislocation solver, which must already be
    /// evaluated at the same stations and set to tensile dislocations
    pub fn with_solver(observations: ObservationSet, grid: SegmentationGrid, solver: Box<dyn DislocationSolver + Send + Sync>) -> Result<Self, Error> {
        if solver.n_observations() != observations.n_stations() {
            return Err(Error::shape_mismatch("solver stations", observations.n_stations(), solver.n_observations()));
        }

        return Ok(SegmentedDike {
            grid,
            observations,
            solver,
            schedule: BayesianSchedule::default(),
            use_cache: true,
            greens_cache: Mutex::new(None),
        });
    }

    pub fn with_schedule(mut self, schedule: BayesianSchedule) -> Self {
        self.schedule = schedule;
        return self;
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        return self;
    }

    pub fn observations(&self) -> &ObservationSet {
        return &self.observations;
    }

    pub fn source_id(&self) -> &'static str {
        return "segmentedDike";
    }

    /// `xcen, ycen, depth, length, width, strike, open0, open1, ...`
    pub fn parameter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = ["xcen", "ycen", "depth", "length", "width", "strike"]
            .iter()
            .map(|name: &&str| name.to_string())
            .collect();
        for i_patch in 0..self.grid.n_patches() {
            names.push(format!("open{i_patch}"));
        }
        return names;
    }

    pub fn n_parameters(&self) -> usize {
        return N_GEOMETRY_PARAMETERS + self.grid.n_patches();
    }

    pub fn get_patches(&self, geometry: &DikeGeometry) -> Vec<Patch> {
        return patches(geometry, &self.grid);
    }

    pub fn get_greens(&self, geometry: &DikeGeometry) -> Result<Array2<f64>, Error> {
        return self.with_greens(geometry, |g: &Array2<f64>| g.clone());
    }

    /// Displacement at the bound stations
    ///
    /// `x` and `y` only set the number of stations, which must match the stations the model was built with.
    ///
    /// # Arguments
    /// * `x`, `y` - station coordinates, shape = `[n_stations]`
    /// * `geometry` - the whole dike
    /// * `openings` - opening of each patch, shape = `[nl * nw]`, patch order
    ///
    /// # Returns
    /// * `(ux, uy, uz)` - each shape = `[n_stations]`
    pub fn model(&self, x: &Array1<f64>, y: &Array1<f64>, geometry: &DikeGeometry, openings: &Array1<f64>) -> Result<Displacement, Error> {
        let n_stations: usize = x.len();
        if y.len() != n_stations {
            return Err(Error::shape_mismatch("model y", n_stations, y.len()));
        }
        if n_stations != self.observations.n_stations() {
            return Err(Error::shape_mismatch("model x", self.observations.n_stations(), n_stations));
        }

        let n_patches: usize = self.grid.n_patches();
        if openings.len() != n_patches {
            return Err(Error::OpeningCountMismatch {
                expected: n_patches,
                actual: openings.len(),
            });
        }

        let displacement: Array1<f64> = self.with_greens(geometry, |g: &Array2<f64>| g.dot(openings))?;
        if displacement.len() != 3 * n_stations {
            return Err(Error::shape_mismatch("displacement", 3 * n_stations, displacement.len()));
        }

        let ux: Array1<f64> = displacement.slice(s![0..n_stations]).to_owned();
        let uy: Array1<f64> = displacement.slice(s![n_stations..2 * n_stations]).to_owned();
        let uz: Array1<f64> = displacement.slice(s![2 * n_stations..3 * n_stations]).to_owned();

        return Ok((ux, uy, uz));
    }

    /// Evaluate the flat parameter vector `[xcen, ycen, depth, length, width, strike, open0, ...]`
    pub fn forward(&self, parameters: &[f64]) -> Result<Displacement, Error> {
        let n_parameters: usize = self.n_parameters();
        if parameters.len() != n_parameters {
            return Err(Error::ParameterCountMismatch {
                expected: n_parameters,
                actual: parameters.len(),
            });
        }

        let geometry: DikeGeometry = DikeGeometry::from_slice(parameters)?;
        let openings: Array1<f64> = Array1::from(parameters[N_GEOMETRY_PARAMETERS..].to_vec());

        return self.model(self.observations.xs(), self.observations.ys(), &geometry, &openings);
    }

    /// Observed minus modelled displacement for the flat parameter vector
    ///
    /// With synthetic observations this is the negated forward model.
    pub fn residuals(&self, parameters: &[f64]) -> Result<Displacement, Error> {
        let (ux, uy, uz): Displacement = self.forward(parameters)?;
        let observed: &ObservationSet = self.observations();

        return Ok((observed.ux() - &ux, observed.uy() - &uy, observed.uz() - &uz));
    }

    /// Run `f` on the Green's table for `geometry`, reusing the last table when the geometry is unchanged
    fn with_greens<T>(&self, geometry: &DikeGeometry, f: impl FnOnce(&Array2<f64>) -> T) -> Result<T, Error> {
        if !self.use_cache {
            let g: Array2<f64> = greens_dike(geometry, &self.grid, self.solver.as_ref())?;
            return Ok(f(&g));
        }

        // The cache only ever holds complete tables, so a poisoned lock is still usable
        let mut cache: MutexGuard<'_, Option<GreensCache>> = self.greens_cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(cached) = cache.as_ref() {
            if cached.geometry.same_bits(geometry) {
                debug!("SegmentedDike: reusing Green's table");
                return Ok(f(&cached.g));
            }
        }

        let g: Array2<f64> = greens_dike(geometry, &self.grid, self.solver.as_ref())?;
        let result: T = f(&g);
        *cache = Some(GreensCache { geometry: *geometry, g });

        return Ok(result);
    }
}

/// Linear solver with a fixed response per call, so the model arithmetic can be checked exactly
#[cfg(test)]
struct LinearSolver {
    n_observations: usize,
}

#[cfg(test)]
impl DislocationSolver for LinearSolver {
    fn forward(&self, parameters: &[f64]) -> Result<Array1<f64>, Error> {
        // Response depends on the patch position and is proportional to the opening
        let (x, y, depth, opening): (f64, f64, f64, f64) = (parameters[0], parameters[1], parameters[2], parameters[5]);
        let displacement: Array1<f64> = Array1::from_shape_fn(3 * self.n_observations, |i_row: usize| {
            opening * (1.0 + i_row as f64 + 1e-3 * x - 2e-3 * y + 1e-4 * depth)
        });
        return Ok(displacement);
    }

    fn n_observations(&self) -> usize {
        return self.n_observations;
    }
}

#[cfg(test)]
fn test_model(n_length: usize, n_width: usize) -> SegmentedDike {
    let xs: Array1<f64> = Array1::from(vec![-4000.0, -1500.0, 500.0, 2500.0, 6000.0]);
    let ys: Array1<f64> = Array1::from(vec![2000.0, -3500.0, 1200.0, -800.0, 300.0]);
    let observations: ObservationSet = ObservationSet::synthetic(xs, ys).unwrap();
    let grid: SegmentationGrid = SegmentationGrid::new(n_length, n_width).unwrap();
    return SegmentedDike::from_observations(observations, grid);
}

#[cfg(test)]
fn test_geometry() -> DikeGeometry {
    return DikeGeometry::new(300.0, -200.0, 2500.0, 4000.0, 2000.0, 30.0);
}

#[test]
fn test_model_zero_openings_give_zero_displacement() {
    let dike: SegmentedDike = test_model(3, 2);
    let openings: Array1<f64> = Array1::zeros(6);

    let (ux, uy, uz): Displacement = dike
        .model(dike.observations().xs(), dike.observations().ys(), &test_geometry(), &openings)
        .unwrap();

    assert_eq!(ux.len(), 5);
    assert!(ux.iter().chain(uy.iter()).chain(uz.iter()).all(|&u: &f64| u == 0.0));
}

#[test]
fn test_model_is_linear_in_openings() {
    use approx::assert_abs_diff_eq;

    let dike: SegmentedDike = test_model(3, 2);
    let geometry: DikeGeometry = test_geometry();
    let xs: &Array1<f64> = dike.observations().xs();
    let ys: &Array1<f64> = dike.observations().ys();

    let openings_a: Array1<f64> = Array1::from(vec![0.5, 1.0, 0.0, 2.0, 0.3, 0.1]);
    let openings_b: Array1<f64> = Array1::from(vec![0.0, -0.4, 1.5, 0.2, 0.0, 0.7]);

    let (ux_a, uy_a, uz_a): Displacement = dike.model(xs, ys, &geometry, &openings_a).unwrap();
    let (ux_b, uy_b, uz_b): Displacement = dike.model(xs, ys, &geometry, &openings_b).unwrap();

    // Scaling
    let (ux_scaled, _uy_scaled, uz_scaled): Displacement = dike.model(xs, ys, &geometry, &(&openings_a * 3.0)).unwrap();
    let precision: f64 = 1e-14;
    assert_abs_diff_eq!(ux_scaled, &ux_a * 3.0, epsilon = precision);
    assert_abs_diff_eq!(uz_scaled, &uz_a * 3.0, epsilon = precision);

    // Superposition
    let (ux_sum, uy_sum, uz_sum): Displacement = dike.model(xs, ys, &geometry, &(&openings_a + &openings_b)).unwrap();
    assert_abs_diff_eq!(ux_sum, &ux_a + &ux_b, epsilon = precision);
    assert_abs_diff_eq!(uy_sum, &uy_a + &uy_b, epsilon = precision);
    assert_abs_diff_eq!(uz_sum, &uz_a + &uz_b, epsilon = precision);
}

#[test]
fn test_model_uniform_opening_matches_whole_dike() {
    use approx::assert_abs_diff_eq;

    let dike: SegmentedDike = test_model(4, 3);
    let geometry: DikeGeometry = test_geometry();
    let openings: Array1<f64> = Array1::ones(12);

    let (ux, uy, uz): Displacement = dike
        .model(dike.observations().xs(), dike.observations().ys(), &geometry, &openings)
        .unwrap();

    let okada: Okada = Okada::new(dike.observations()).with_type(DislocationType::Tensile);
    let whole_dike: Array1<f64> = okada
        .forward(&[300.0, -200.0, 2500.0, 4000.0, 2000.0, 1.0, 30.0, 90.0])
        .unwrap();

    let precision: f64 = 1e-10;
    assert_abs_diff_eq!(ux.view(), whole_dike.slice(s![0..5]), epsilon = precision);
    assert_abs_diff_eq!(uy.view(), whole_dike.slice(s![5..10]), epsilon = precision);
    assert_abs_diff_eq!(uz.view(), whole_dike.slice(s![10..15]), epsilon = precision);
}

#[test]
fn test_model_with_custom_solver() {
    use approx::assert_abs_diff_eq;

    let observations: ObservationSet = ObservationSet::synthetic(Array1::from(vec![0.0, 1.0]), Array1::from(vec![0.0, 1.0])).unwrap();
    let grid: SegmentationGrid = SegmentationGrid::new(2, 1).unwrap();
    let dike: SegmentedDike = SegmentedDike::with_solver(observations, grid, Box::new(LinearSolver { n_observations: 2 })).unwrap();

    // strike = 0 puts the patches at y = -500 and y = +500
    let geometry: DikeGeometry = DikeGeometry::new(0.0, 0.0, 1000.0, 2000.0, 1000.0, 0.0);
    let g: Array2<f64> = dike.get_greens(&geometry).unwrap();
    assert_eq!(g.shape(), &[6, 2]);
    assert_abs_diff_eq!(g[(0, 0)], 2.1, epsilon = 1e-12);
    assert_abs_diff_eq!(g[(0, 1)], 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(g[(5, 0)], 7.1, epsilon = 1e-12);

    let openings: Array1<f64> = Array1::from(vec![2.0, 1.0]);
    let (ux, uy, uz): Displacement = dike.model(dike.observations().xs(), dike.observations().ys(), &geometry, &openings).unwrap();
    let expected: Array1<f64> = g.dot(&openings);
    assert_eq!(ux, expected.slice(s![0..2]).to_owned());
    assert_eq!(uy, expected.slice(s![2..4]).to_owned());
    assert_eq!(uz, expected.slice(s![4..6]).to_owned());
}

#[test]
fn test_with_solver_rejects_station_mismatch() {
    let observations: ObservationSet = ObservationSet::synthetic(Array1::from(vec![0.0, 1.0]), Array1::from(vec![0.0, 1.0])).unwrap();
    let result: Result<SegmentedDike, Error> =
        SegmentedDike::with_solver(observations, SegmentationGrid::default(), Box::new(LinearSolver { n_observations: 3 }));

    assert!(matches!(result, Err(Error::ShapeMismatch { expected: 2, actual: 3, .. })));
}

#[test]
fn test_model_rejects_wrong_opening_count() {
    let dike: SegmentedDike = test_model(2, 2);
    let openings: Array1<f64> = Array1::ones(3);

    let result: Result<Displacement, Error> = dike.model(dike.observations().xs(), dike.observations().ys(), &test_geometry(), &openings);

    assert_eq!(result, Err(Error::OpeningCountMismatch { expected: 4, actual: 3 }));
}

#[test]
fn test_model_rejects_wrong_station_count() {
    let dike: SegmentedDike = test_model(1, 1);
    let openings: Array1<f64> = Array1::ones(1);
    let x: Array1<f64> = Array1::zeros(4);
    let y: Array1<f64> = Array1::zeros(4);

    let result: Result<Displacement, Error> = dike.model(&x, &y, &test_geometry(), &openings);
    assert_eq!(result, Err(Error::shape_mismatch("model x", 5, 4)));

    let y_short: Array1<f64> = Array1::zeros(3);
    let result: Result<Displacement, Error> = dike.model(&x, &y_short, &test_geometry(), &openings);
    assert_eq!(result, Err(Error::shape_mismatch("model y", 4, 3)));
}

#[test]
fn test_get_patches_two_along_north() {
    let dike: SegmentedDike = test_model(2, 1);
    let geometry: DikeGeometry = DikeGeometry::new(0.0, 0.0, 1000.0, 2000.0, 1000.0, 0.0);

    let dike_patches: Vec<Patch> = dike.get_patches(&geometry);

    assert_eq!(dike_patches.len(), 2);
    assert_eq!((dike_patches[0].x, dike_patches[0].y, dike_patches[0].depth), (0.0, -500.0, 1000.0));
    assert_eq!((dike_patches[1].x, dike_patches[1].y, dike_patches[1].depth), (0.0, 500.0, 1000.0));
}

#[test]
fn test_greens_cache_returns_identical_table() {
    let cached: SegmentedDike = test_model(3, 2);
    let uncached: SegmentedDike = test_model(3, 2).with_cache(false);
    let geometry: DikeGeometry = test_geometry();

    let g_first: Array2<f64> = cached.get_greens(&geometry).unwrap();
    let g_second: Array2<f64> = cached.get_greens(&geometry).unwrap();
    let g_uncached: Array2<f64> = uncached.get_greens(&geometry).unwrap();
    assert_eq!(g_first, g_second);
    assert_eq!(g_first, g_uncached);

    // A new geometry replaces the cached table
    let moved: DikeGeometry = DikeGeometry::new(800.0, -200.0, 2500.0, 4000.0, 2000.0, 30.0);
    let g_moved: Array2<f64> = cached.get_greens(&moved).unwrap();
    assert_ne!(g_moved, g_first);
    assert_eq!(g_moved, uncached.get_greens(&moved).unwrap());
}

#[test]
fn test_forward_matches_model() {
    let dike: SegmentedDike = test_model(2, 2);
    let parameters: Vec<f64> = vec![300.0, -200.0, 2500.0, 4000.0, 2000.0, 30.0, 0.4, 1.1, 0.0, 0.8];

    let from_forward: Displacement = dike.forward(&parameters).unwrap();
    let openings: Array1<f64> = Array1::from(vec![0.4, 1.1, 0.0, 0.8]);
    let from_model: Displacement = dike
        .model(dike.observations().xs(), dike.observations().ys(), &test_geometry(), &openings)
        .unwrap();

    assert_eq!(from_forward, from_model);

    let too_many: Result<Displacement, Error> = dike.forward(&[parameters.clone(), vec![0.0]].concat());
    assert_eq!(too_many, Err(Error::ParameterCountMismatch { expected: 10, actual: 11 }));
}

#[test]
fn test_parameter_names_and_schedule() {
    let dike: SegmentedDike = test_model(3, 1).with_schedule(BayesianSchedule::new(Some(20_000), Some(2_000), Some(10)));

    assert_eq!(
        dike.parameter_names(),
        vec!["xcen", "ycen", "depth", "length", "width", "strike", "open0", "open1", "open2"]
    );
    assert_eq!(dike.n_parameters(), 9);
    assert_eq!(dike.source_id(), "segmentedDike");
    assert_eq!(dike.bayesian_steps(), (20_000, 2_000, 10));
    assert!(!dike.time_dependent());
}

#[test]
fn test_residuals_are_observed_minus_model() {
    use approx::assert_abs_diff_eq;

    let parameters: Vec<f64> = vec![300.0, -200.0, 2500.0, 4000.0, 2000.0, 30.0, 0.4, 1.1];

    // Synthetic stations observe zero, so the residual is the negated model
    let synthetic: SegmentedDike = test_model(2, 1);
    let (ux, uy, uz): Displacement = synthetic.forward(&parameters).unwrap();
    let (rx, ry, rz): Displacement = synthetic.residuals(&parameters).unwrap();
    assert_eq!(rx, -&ux);
    assert_eq!(ry, -&uy);
    assert_eq!(rz, -&uz);

    // Observing the model itself leaves nothing
    let observed: ObservationSet =
        ObservationSet::new(synthetic.observations().xs().clone(), synthetic.observations().ys().clone(), ux, uy, uz).unwrap();
    let matched: SegmentedDike = SegmentedDike::from_observations(observed, SegmentationGrid::new(2, 1).unwrap());
    let (rx, ry, rz): Displacement = matched.residuals(&parameters).unwrap();
    assert_abs_diff_eq!(rx, Array1::<f64>::zeros(5), epsilon = 1e-15);
    assert_abs_diff_eq!(ry, Array1::<f64>::zeros(5), epsilon = 1e-15);
    assert_abs_diff_eq!(rz, Array1::<f64>::zeros(5), epsilon = 1e-15);
}

#[test]
fn test_python_model_takes_openings_as_tuple() {
    pyo3::prepare_freethreaded_python();
    Python::with_gil(|py| {
        // Arrays are handed over as numpy arrays
        if py.import("numpy").is_err() {
            return;
        }

        let dike: SegmentedDike = test_model(2, 1);
        let xs: Vec<f64> = dike.observations().xs().to_vec();
        let ys: Vec<f64> = dike.observations().ys().to_vec();

        let openings: Bound<'_, PyTuple> = PyTuple::new(py, vec![0.5, 1.5]).unwrap();
        let (ux, _uy, uz): (Py<PyArray1<f64>>, Py<PyArray1<f64>>, Py<PyArray1<f64>>) = dike
            .model_py(
                py,
                PyArray1::from_vec(py, xs.clone()).readonly(),
                PyArray1::from_vec(py, ys.clone()).readonly(),
                300.0,
                -200.0,
                2500.0,
                4000.0,
                2000.0,
                30.0,
                &openings,
            )
            .unwrap();
        let expected: Displacement = dike.forward(&[300.0, -200.0, 2500.0, 4000.0, 2000.0, 30.0, 0.5, 1.5]).unwrap();
        assert_eq!(ux.bind(py).to_owned_array(), expected.0);
        assert_eq!(uz.bind(py).to_owned_array(), expected.2);

        let too_few: Bound<'_, PyTuple> = PyTuple::new(py, vec![0.5]).unwrap();
        let result: PyResult<(Py<PyArray1<f64>>, Py<PyArray1<f64>>, Py<PyArray1<f64>>)> = dike.model_py(
            py,
            PyArray1::from_vec(py, xs).readonly(),
            PyArray1::from_vec(py, ys).readonly(),
            300.0,
            -200.0,
            2500.0,
            4000.0,
            2000.0,
            30.0,
            &too_few,
        );
        assert!(matches!(result, Err(ref error) if error.is_instance_of::<PyValueError>(py)));
    });
}

#[test]
fn test_python_constructor_rejects_negative_segment_count() {
    pyo3::prepare_freethreaded_python();
    Python::with_gil(|py| {
        if py.import("numpy").is_err() {
            return;
        }

        let xs: Vec<f64> = vec![-1000.0, 0.0, 1500.0];
        let ys: Vec<f64> = vec![500.0, -200.0, 0.0];
        let result: PyResult<SegmentedDike> = SegmentedDike::new(
            PyArray1::from_vec(py, xs).readonly(),
            PyArray1::from_vec(py, ys).readonly(),
            None,
            None,
            None,
            Some(-1),
            Some(2),
            None,
            None,
            None,
            true,
        );
        assert!(matches!(result, Err(ref error) if error.is_instance_of::<PyValueError>(py)));
    });
}
