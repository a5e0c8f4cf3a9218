use crate::errors::Error;

/// Geometry of the whole dike, as proposed by the sampler
///
/// * `xcen`, `ycen` - surface coordinates of the dike centre
/// * `depth` - depth to the dike centre (positive down)
/// * `length` - along-strike (horizontal) extent
/// * `width` - along-dip (vertical) extent
/// * `strike` - orientation of the long axis, degrees clockwise from north
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DikeGeometry {
    pub xcen: f64,
    pub ycen: f64,
    pub depth: f64,
    pub length: f64,
    pub width: f64,
    pub strike: f64,
}

/// Number of geometric parameters at the front of the flat parameter vector
pub const N_GEOMETRY_PARAMETERS: usize = 6;

impl DikeGeometry {
    pub fn new(xcen: f64, ycen: f64, depth: f64, length: f64, width: f64, strike: f64) -> Self {
        return DikeGeometry {
            xcen,
            ycen,
            depth,
            length,
            width,
            strike,
        };
    }

    /// Read the geometry from the front of a flat parameter vector
    /// `[xcen, ycen, depth, length, width, strike, ...]`
    pub fn from_slice(parameters: &[f64]) -> Result<Self, Error> {
        if parameters.len() < N_GEOMETRY_PARAMETERS {
            return Err(Error::ParameterCountMismatch {
                expected: N_GEOMETRY_PARAMETERS,
                actual: parameters.len(),
            });
        }

        return Ok(DikeGeometry::new(parameters[0], parameters[1], parameters[2], parameters[3], parameters[4], parameters[5]));
    }

    /// Bit-for-bit comparison, used as the Green's cache key
    pub fn same_bits(&self, other: &DikeGeometry) -> bool {
        return self.xcen.to_bits() == other.xcen.to_bits()
            && self.ycen.to_bits() == other.ycen.to_bits()
            && self.depth.to_bits() == other.depth.to_bits()
            && self.length.to_bits() == other.length.to_bits()
            && self.width.to_bits() == other.width.to_bits()
            && self.strike.to_bits() == other.strike.to_bits();
    }
}

/// Number of patches along the length (`n_length`) and width (`n_width`) of the dike.
/// Fixed when the model is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentationGrid {
    n_length: usize,
    n_width: usize,
}

impl SegmentationGrid {
    pub fn new(n_length: usize, n_width: usize) -> Result<Self, Error> {
        if n_length == 0 || n_width == 0 {
            return Err(Error::NonPositiveSegmentCount {
                n_length: n_length as i64,
                n_width: n_width as i64,
            });
        }

        return Ok(SegmentationGrid { n_length, n_width });
    }

    /// Same as [`SegmentationGrid::new`] for counts that may arrive negative, e.g. from Python
    pub fn from_signed(n_length: i64, n_width: i64) -> Result<Self, Error> {
        if n_length <= 0 || n_width <= 0 {
            return Err(Error::NonPositiveSegmentCount { n_length, n_width });
        }

        return SegmentationGrid::new(n_length as usize, n_width as usize);
    }

    pub fn n_length(&self) -> usize {
        return self.n_length;
    }

    pub fn n_width(&self) -> usize {
        return self.n_width;
    }

    pub fn n_patches(&self) -> usize {
        return self.n_length * self.n_width;
    }
}

impl Default for SegmentationGrid {
    fn default() -> Self {
        return SegmentationGrid { n_length: 1, n_width: 1 };
    }
}

#[test]
fn test_segmentation_grid_rejects_zero_counts() {
    assert_eq!(
        SegmentationGrid::new(0, 3),
        Err(Error::NonPositiveSegmentCount { n_length: 0, n_width: 3 })
    );
    assert_eq!(
        SegmentationGrid::new(2, 0),
        Err(Error::NonPositiveSegmentCount { n_length: 2, n_width: 0 })
    );

    let grid: SegmentationGrid = SegmentationGrid::new(4, 3).unwrap();
    assert_eq!(grid.n_patches(), 12);
    assert_eq!(SegmentationGrid::default().n_patches(), 1);
}

#[test]
fn test_segmentation_grid_from_signed_counts() {
    assert_eq!(
        SegmentationGrid::from_signed(-2, 3),
        Err(Error::NonPositiveSegmentCount { n_length: -2, n_width: 3 })
    );
    assert_eq!(
        SegmentationGrid::from_signed(4, 0),
        Err(Error::NonPositiveSegmentCount { n_length: 4, n_width: 0 })
    );
    assert_eq!(SegmentationGrid::from_signed(3, 2), SegmentationGrid::new(3, 2));
}

#[test]
fn test_dike_geometry_from_slice() {
    let parameters: Vec<f64> = vec![1.0, 2.0, 3000.0, 4000.0, 500.0, 45.0, 0.7, 0.9];
    let geometry: DikeGeometry = DikeGeometry::from_slice(&parameters).unwrap();
    assert_eq!(geometry, DikeGeometry::new(1.0, 2.0, 3000.0, 4000.0, 500.0, 45.0));

    let too_short: Result<DikeGeometry, Error> = DikeGeometry::from_slice(&parameters[..5]);
    assert_eq!(too_short, Err(Error::ParameterCountMismatch { expected: 6, actual: 5 }));
}
