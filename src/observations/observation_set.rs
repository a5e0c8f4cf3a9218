use crate::errors::Error;
use ndarray::Array1;

/// Surface stations and the three displacement components observed at them
///
/// Data structure:
/// ```ignore
/// xs = Array1<f64>;  shape=[n_stations]   // east
/// ys = Array1<f64>;  shape=[n_stations]   // north
/// ux = Array1<f64>;  shape=[n_stations]
/// uy = Array1<f64>;  shape=[n_stations]
/// uz = Array1<f64>;  shape=[n_stations]
/// ```
#[derive(Clone, Debug)]
pub struct ObservationSet {
    xs: Array1<f64>,
    ys: Array1<f64>,
    ux: Array1<f64>,
    uy: Array1<f64>,
    uz: Array1<f64>,
}

impl ObservationSet {
    pub fn new(xs: Array1<f64>, ys: Array1<f64>, ux: Array1<f64>, uy: Array1<f64>, uz: Array1<f64>) -> Result<Self, Error> {
        let n_stations: usize = xs.len();
        for (name, component) in [("ys", &ys), ("ux", &ux), ("uy", &uy), ("uz", &uz)] {
            if component.len() != n_stations {
                return Err(Error::shape_mismatch(format!("ObservationSet.{name}"), n_stations, component.len()));
            }
        }

        return Ok(ObservationSet { xs, ys, ux, uy, uz });
    }

    /// Stations with zero placeholder displacements.
    /// Only the coordinates matter when the set is used to evaluate Green's functions.
    pub fn synthetic(xs: Array1<f64>, ys: Array1<f64>) -> Result<Self, Error> {
        let ux: Array1<f64> = &xs * 0.0;
        let uy: Array1<f64> = &xs * 0.0;
        let uz: Array1<f64> = &xs * 0.0;

        return ObservationSet::new(xs, ys, ux, uy, uz);
    }

    /// Same stations with the observed data replaced by zeros
    pub fn to_synthetic(&self) -> Self {
        let n_stations: usize = self.n_stations();
        return ObservationSet {
            xs: self.xs.clone(),
            ys: self.ys.clone(),
            ux: Array1::zeros(n_stations),
            uy: Array1::zeros(n_stations),
            uz: Array1::zeros(n_stations),
        };
    }

    pub fn n_stations(&self) -> usize {
        return self.xs.len();
    }

    pub fn xs(&self) -> &Array1<f64> {
        return &self.xs;
    }

    pub fn ys(&self) -> &Array1<f64> {
        return &self.ys;
    }

    pub fn ux(&self) -> &Array1<f64> {
        return &self.ux;
    }

    pub fn uy(&self) -> &Array1<f64> {
        return &self.uy;
    }

    pub fn uz(&self) -> &Array1<f64> {
        return &self.uz;
    }
}

#[test]
fn test_synthetic_observations_are_zero() {
    let xs: Array1<f64> = Array1::from(vec![-1000.0, 0.0, 2500.0]);
    let ys: Array1<f64> = Array1::from(vec![300.0, -40.0, 0.0]);

    let observations: ObservationSet = ObservationSet::synthetic(xs.clone(), ys.clone()).unwrap();

    assert_eq!(observations.n_stations(), 3);
    assert_eq!(observations.xs(), &xs);
    assert_eq!(observations.ys(), &ys);
    assert!(observations.ux().iter().all(|&u: &f64| u == 0.0));
    assert!(observations.uy().iter().all(|&u: &f64| u == 0.0));
    assert!(observations.uz().iter().all(|&u: &f64| u == 0.0));
}

#[test]
fn test_observations_reject_ragged_components() {
    let xs: Array1<f64> = Array1::from(vec![0.0, 1.0]);
    let ys: Array1<f64> = Array1::from(vec![0.0]);

    let result: Result<ObservationSet, Error> = ObservationSet::synthetic(xs, ys);
    assert_eq!(result.unwrap_err(), Error::shape_mismatch("ObservationSet.ys", 2, 1));
}

#[test]
fn test_to_synthetic_keeps_coordinates() {
    let xs: Array1<f64> = Array1::from(vec![5.0, 6.0]);
    let ys: Array1<f64> = Array1::from(vec![7.0, 8.0]);
    let observed: Array1<f64> = Array1::from(vec![0.01, -0.02]);

    let observations: ObservationSet = ObservationSet::new(xs.clone(), ys.clone(), observed.clone(), observed.clone(), observed).unwrap();
    let synthetic: ObservationSet = observations.to_synthetic();

    assert_eq!(synthetic.xs(), &xs);
    assert_eq!(synthetic.ys(), &ys);
    assert_eq!(synthetic.uz(), &Array1::<f64>::zeros(2));
}
