use crate::errors::Error;
use crate::observations::ObservationSet;
use crate::okada::okada85;
use ndarray::{Array1, Axis, concatenate, s};
use numpy::IntoPyArray;
use numpy::PyArray1;
use numpy::PyArrayMethods;
use numpy::borrow::PyReadonlyArray1;
use pyo3::prelude::*;
use std::str::FromStr;

/// Number of entries in a dislocation parameter vector:
/// `[xcen, ycen, depth, length, width, slip, strike, dip]`
pub const N_DISLOCATION_PARAMETERS: usize = 8;

/// A rectangular dislocation source evaluated at a fixed set of stations
pub trait DislocationSolver {
    /// Displacement for `[xcen, ycen, depth, length, width, slip, strike, dip]`
    ///
    /// Returned flat as `[u_x(0..n), u_y(0..n), u_z(0..n)]` for `n` stations.
    fn forward(&self, parameters: &[f64]) -> Result<Array1<f64>, Error>;

    fn n_observations(&self) -> usize;
}

/// Which component of the dislocation the `slip` parameter drives
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DislocationType {
    StrikeSlip,
    DipSlip,
    Tensile,
}

impl FromStr for DislocationType {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Error> {
        return match name {
            "slip" | "strike_slip" => Ok(DislocationType::StrikeSlip),
            "dip_slip" => Ok(DislocationType::DipSlip),
            "open" | "tensile" => Ok(DislocationType::Tensile),
            _ => Err(Error::UnknownDislocationType { name: name.to_string() }),
        };
    }
}

/// Okada (1985) rectangular dislocation, bound to a set of stations
#[derive(Clone, Debug)]
pub struct Okada {
    xs: Array1<f64>,
    ys: Array1<f64>,
    dislocation_type: DislocationType,
    nu: f64,
}

impl Okada {
    pub fn new(observations: &ObservationSet) -> Self {
        return Okada {
            xs: observations.xs().clone(),
            ys: observations.ys().clone(),
            dislocation_type: DislocationType::StrikeSlip,
            nu: 0.25,
        };
    }

    pub fn set_type(&mut self, dislocation_type: DislocationType) {
        self.dislocation_type = dislocation_type;
    }

    pub fn with_type(mut self, dislocation_type: DislocationType) -> Self {
        self.set_type(dislocation_type);
        return self;
    }

    pub fn with_poisson_ratio(mut self, nu: f64) -> Self {
        self.nu = nu;
        return self;
    }

    pub fn dislocation_type(&self) -> DislocationType {
        return self.dislocation_type;
    }
}

impl DislocationSolver for Okada {
    fn forward(&self, parameters: &[f64]) -> Result<Array1<f64>, Error> {
        if parameters.len() != N_DISLOCATION_PARAMETERS {
            return Err(Error::ParameterCountMismatch {
                expected: N_DISLOCATION_PARAMETERS,
                actual: parameters.len(),
            });
        }
        let (xcen, ycen, depth, length, width, slip, strike, dip): (f64, f64, f64, f64, f64, f64, f64, f64) = (
            parameters[0],
            parameters[1],
            parameters[2],
            parameters[3],
            parameters[4],
            parameters[5],
            parameters[6],
            parameters[7],
        );

        // A zero-area rectangle has no defined response
        if !(length > 0.0) || !(width > 0.0) {
            return Err(Error::solver_failure(format!(
                "rectangle must have positive dimensions, length={length}, width={width}"
            )));
        }

        let (strike_slip, dip_slip, opening): (f64, f64, f64) = match self.dislocation_type {
            DislocationType::StrikeSlip => (slip, 0.0, 0.0),
            DislocationType::DipSlip => (0.0, slip, 0.0),
            DislocationType::Tensile => (0.0, 0.0, slip),
        };

        // Stations relative to the centroid
        let e: Array1<f64> = &self.xs - xcen;
        let n: Array1<f64> = &self.ys - ycen;

        let (u_e, u_n, u_z): (Array1<f64>, Array1<f64>, Array1<f64>) =
            okada85(&e, &n, depth, strike, dip, length, width, strike_slip, dip_slip, opening, self.nu);

        let displacement: Array1<f64> = concatenate(Axis(0), &[u_e.view(), u_n.view(), u_z.view()])
            .map_err(|error| Error::solver_failure(format!("could not stack displacement components: {error}")))?;

        // Singular geometry, e.g. a rectangle breaking the surface right under a station
        if let Some(i_bad) = displacement.iter().position(|u: &f64| !u.is_finite()) {
            let n_stations: usize = self.n_observations();
            return Err(Error::solver_failure(format!(
                "non-finite displacement at station {} (component {})",
                i_bad % n_stations,
                i_bad / n_stations
            )));
        }

        return Ok(displacement);
    }

    fn n_observations(&self) -> usize {
        return self.xs.len();
    }
}

/// Evaluate a single rectangular dislocation from Python, returns `(u_e, u_n, u_z)`
#[pyfunction]
#[pyo3(signature = (xs, ys, xcen, ycen, depth, length, width, slip, strike, dip, dislocation_type="open", nu=0.25))]
pub fn okada_py(
    py: Python,
    xs: PyReadonlyArray1<f64>,
    ys: PyReadonlyArray1<f64>,
    xcen: f64,
    ycen: f64,
    depth: f64,
    length: f64,
    width: f64,
    slip: f64,
    strike: f64,
    dip: f64,
    dislocation_type: &str,
    nu: f64,
) -> PyResult<(Py<PyArray1<f64>>, Py<PyArray1<f64>>, Py<PyArray1<f64>>)> {
    // Convert into Rust data types
    let xs_ndarray: Array1<f64> = xs.to_owned_array();
    let ys_ndarray: Array1<f64> = ys.to_owned_array();
    let observations: ObservationSet = ObservationSet::synthetic(xs_ndarray, ys_ndarray)?;

    let okada: Okada = Okada::new(&observations)
        .with_type(DislocationType::from_str(dislocation_type)?)
        .with_poisson_ratio(nu);
    let displacement: Array1<f64> = okada.forward(&[xcen, ycen, depth, length, width, slip, strike, dip])?;

    let n_stations: usize = observations.n_stations();
    let u_e: Array1<f64> = displacement.slice(s![0..n_stations]).to_owned();
    let u_n: Array1<f64> = displacement.slice(s![n_stations..2 * n_stations]).to_owned();
    let u_z: Array1<f64> = displacement.slice(s![2 * n_stations..3 * n_stations]).to_owned();

    return Ok((u_e.into_pyarray(py).into(), u_n.into_pyarray(py).into(), u_z.into_pyarray(py).into()));
}

#[test]
fn test_okada_forward_stacks_components() {
    use approx::assert_abs_diff_eq;

    let xs: Array1<f64> = Array1::from(vec![1500.0, -800.0, 300.0]);
    let ys: Array1<f64> = Array1::from(vec![200.0, 900.0, -2500.0]);
    let observations: ObservationSet = ObservationSet::synthetic(xs.clone(), ys.clone()).unwrap();
    let okada: Okada = Okada::new(&observations).with_type(DislocationType::Tensile);

    let parameters: Vec<f64> = vec![100.0, -50.0, 2000.0, 3000.0, 1000.0, 2.0, 15.0, 90.0];
    let displacement: Array1<f64> = okada.forward(&parameters).unwrap();
    assert_eq!(displacement.len(), 9);

    let (u_e, u_n, u_z): (Array1<f64>, Array1<f64>, Array1<f64>) =
        okada85(&(&xs - 100.0), &(&ys + 50.0), 2000.0, 15.0, 90.0, 3000.0, 1000.0, 0.0, 0.0, 2.0, 0.25);

    let precision: f64 = 1e-14;
    assert_abs_diff_eq!(displacement.slice(s![0..3]), u_e.view(), epsilon = precision);
    assert_abs_diff_eq!(displacement.slice(s![3..6]), u_n.view(), epsilon = precision);
    assert_abs_diff_eq!(displacement.slice(s![6..9]), u_z.view(), epsilon = precision);
}

#[test]
fn test_okada_rejects_bad_parameters() {
    let observations: ObservationSet = ObservationSet::synthetic(Array1::from(vec![0.0]), Array1::from(vec![1000.0])).unwrap();
    let okada: Okada = Okada::new(&observations).with_type(DislocationType::Tensile);

    let too_few: Result<Array1<f64>, Error> = okada.forward(&[0.0, 0.0, 1000.0]);
    assert_eq!(too_few, Err(Error::ParameterCountMismatch { expected: 8, actual: 3 }));

    let zero_width: Result<Array1<f64>, Error> = okada.forward(&[0.0, 0.0, 1000.0, 2000.0, 0.0, 1.0, 0.0, 90.0]);
    assert!(matches!(zero_width, Err(Error::SolverFailure { .. })));
}

#[test]
fn test_okada_surface_breaking_dike_fails() {
    // Top edge at the surface, station right on the trace beyond the tip
    let observations: ObservationSet = ObservationSet::synthetic(Array1::from(vec![0.0]), Array1::from(vec![-2000.0])).unwrap();
    let okada: Okada = Okada::new(&observations).with_type(DislocationType::Tensile);

    let result: Result<Array1<f64>, Error> = okada.forward(&[0.0, 0.0, 500.0, 2000.0, 1000.0, 1.0, 0.0, 90.0]);
    assert!(matches!(result, Err(Error::SolverFailure { .. })));
}

#[test]
fn test_okada_dislocation_type_selects_component() {
    use approx::assert_abs_diff_eq;

    let xs: Array1<f64> = Array1::from(vec![1800.0, -600.0]);
    let ys: Array1<f64> = Array1::from(vec![-400.0, 2100.0]);
    let observations: ObservationSet = ObservationSet::synthetic(xs.clone(), ys.clone()).unwrap();
    let parameters: Vec<f64> = vec![0.0, 0.0, 3000.0, 4000.0, 2000.0, 1.5, 40.0, 60.0];

    let expected: [(DislocationType, (f64, f64, f64)); 3] = [
        (DislocationType::StrikeSlip, (1.5, 0.0, 0.0)),
        (DislocationType::DipSlip, (0.0, 1.5, 0.0)),
        (DislocationType::Tensile, (0.0, 0.0, 1.5)),
    ];
    for (dislocation_type, (strike_slip, dip_slip, opening)) in expected {
        let okada: Okada = Okada::new(&observations).with_type(dislocation_type);
        assert_eq!(okada.dislocation_type(), dislocation_type);
        let displacement: Array1<f64> = okada.forward(&parameters).unwrap();

        let (_u_e, _u_n, u_z): (Array1<f64>, Array1<f64>, Array1<f64>) =
            okada85(&xs, &ys, 3000.0, 40.0, 60.0, 4000.0, 2000.0, strike_slip, dip_slip, opening, 0.25);
        assert_abs_diff_eq!(displacement.slice(s![4..6]), u_z.view(), epsilon = 1e-14);
    }
}

#[test]
fn test_dislocation_type_from_str() {
    assert_eq!(DislocationType::from_str("open"), Ok(DislocationType::Tensile));
    assert_eq!(DislocationType::from_str("slip"), Ok(DislocationType::StrikeSlip));
    assert_eq!(DislocationType::from_str("dip_slip"), Ok(DislocationType::DipSlip));
    assert_eq!(
        DislocationType::from_str("mogi"),
        Err(Error::UnknownDislocationType { name: "mogi".to_string() })
    );
}

#[test]
fn test_okada_py_matches_solver() {
    pyo3::prepare_freethreaded_python();
    Python::with_gil(|py| {
        // Arrays are handed over as numpy arrays
        if py.import("numpy").is_err() {
            return;
        }

        let xs: Vec<f64> = vec![1500.0, -800.0];
        let ys: Vec<f64> = vec![200.0, 900.0];
        let (u_e, _u_n, u_z): (Py<PyArray1<f64>>, Py<PyArray1<f64>>, Py<PyArray1<f64>>) = okada_py(
            py,
            PyArray1::from_vec(py, xs.clone()).readonly(),
            PyArray1::from_vec(py, ys.clone()).readonly(),
            0.0,
            0.0,
            2000.0,
            3000.0,
            1000.0,
            1.0,
            0.0,
            90.0,
            "open",
            0.25,
        )
        .unwrap();

        let observations: ObservationSet = ObservationSet::synthetic(Array1::from(xs), Array1::from(ys)).unwrap();
        let okada: Okada = Okada::new(&observations).with_type(DislocationType::Tensile);
        let displacement: Array1<f64> = okada.forward(&[0.0, 0.0, 2000.0, 3000.0, 1000.0, 1.0, 0.0, 90.0]).unwrap();
        assert_eq!(u_e.bind(py).to_owned_array(), displacement.slice(s![0..2]).to_owned());
        assert_eq!(u_z.bind(py).to_owned_array(), displacement.slice(s![4..6]).to_owned());
    });
}
