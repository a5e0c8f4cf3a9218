use ndarray::Array1;

const PI: f64 = std::f64::consts::PI;

/// Trigonometry of the dip angle and the elastic constant shared by all the Okada sub-functions
#[derive(Clone, Copy)]
struct DipTerms {
    sin_dip: f64,
    cos_dip: f64,
    one_minus_two_nu: f64, // mu / (lambda + mu)
}

impl DipTerms {
    /// Below this `cos(dip)` the plane is treated as vertical and the limiting forms of the `I` functions are used
    fn is_vertical(&self) -> bool {
        return self.cos_dip <= f64::EPSILON;
    }
}

/// Surface displacement from a finite rectangular dislocation in an elastic half-space
///
/// Equations taken from:
/// Y. Okada, "Surface deformation due to shear and tensile faults in a half-space", Bull. Seismol. Soc. Am., 1985
///
/// The source is described by its centroid and extends `length` along strike and `width` down dip.
/// The three dislocation components are superposed.
///
/// # Arguments
/// * `e` - east coordinate of the stations, relative to the centroid
/// * `n` - north coordinate of the stations, relative to the centroid, same length as `e`
/// * `depth` - depth of the centroid (positive down)
/// * `strike` - degrees clockwise from north
/// * `dip` - degrees from horizontal
/// * `length` - along-strike extent
/// * `width` - down-dip extent
/// * `strike_slip` - left-lateral slip component
/// * `dip_slip` - reverse slip component
/// * `opening` - tensile component
/// * `nu` - Poisson's ratio
///
/// # Returns
/// * `(u_e, u_n, u_z)` - east, north and vertical displacement at each station
///
/// # Examples
/// ```
/// use ndarray::Array1;
/// use segdike_rs::okada::okada85;
///
/// let e: Array1<f64> = Array1::from(vec![1500.0, -1500.0]);
/// let n: Array1<f64> = Array1::from(vec![0.0, 0.0]);
///
/// // Vertical, north striking dike with unit opening
/// let (u_e, _u_n, u_z): (Array1<f64>, Array1<f64>, Array1<f64>) =
///     okada85(&e, &n, 2000.0, 0.0, 90.0, 3000.0, 1000.0, 0.0, 0.0, 1.0, 0.25);
///
/// assert!((u_e[0] + u_e[1]).abs() < 1e-10);
/// assert!((u_z[0] - u_z[1]).abs() < 1e-10);
/// ```
///
pub fn okada85(
    e: &Array1<f64>,
    n: &Array1<f64>,
    depth: f64,
    strike: f64,
    dip: f64,
    length: f64,
    width: f64,
    strike_slip: f64,
    dip_slip: f64,
    opening: f64,
    nu: f64,
) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
    let n_stations: usize = e.len();

    let (sin_strike, cos_strike): (f64, f64) = strike.to_radians().sin_cos();
    let (sin_dip, cos_dip): (f64, f64) = dip.to_radians().sin_cos();
    let dip_terms: DipTerms = DipTerms {
        sin_dip,
        cos_dip,
        one_minus_two_nu: 1.0 - 2.0 * nu,
    };

    // Okada's reference point is the bottom edge of the plane
    let d: f64 = depth + sin_dip * width / 2.0;

    let mut u_e: Array1<f64> = Array1::zeros(n_stations);
    let mut u_n: Array1<f64> = Array1::zeros(n_stations);
    let mut u_z: Array1<f64> = Array1::zeros(n_stations);
    for i_station in 0..n_stations {
        // Convert from (east, north) relative to the centroid into Okada's fault coordinates
        let e_corner: f64 = e[i_station] + cos_strike * cos_dip * width / 2.0;
        let n_corner: f64 = n[i_station] - sin_strike * cos_dip * width / 2.0;
        let x: f64 = cos_strike * n_corner + sin_strike * e_corner + length / 2.0;
        let y: f64 = sin_strike * n_corner - cos_strike * e_corner + cos_dip * width;

        let p: f64 = y * cos_dip + d * sin_dip;
        let q: f64 = y * sin_dip - d * cos_dip;

        let mut u_x: f64 = 0.0;
        let mut u_y: f64 = 0.0;
        let mut u_vertical: f64 = 0.0;

        // Skip zero components so that a singular term cannot poison the sum with `0 * NaN`
        if strike_slip != 0.0 {
            u_x -= strike_slip / (2.0 * PI) * chinnery(ux_strike_slip, x, p, length, width, q, &dip_terms);
            u_y -= strike_slip / (2.0 * PI) * chinnery(uy_strike_slip, x, p, length, width, q, &dip_terms);
            u_vertical -= strike_slip / (2.0 * PI) * chinnery(uz_strike_slip, x, p, length, width, q, &dip_terms);
        }
        if dip_slip != 0.0 {
            u_x -= dip_slip / (2.0 * PI) * chinnery(ux_dip_slip, x, p, length, width, q, &dip_terms);
            u_y -= dip_slip / (2.0 * PI) * chinnery(uy_dip_slip, x, p, length, width, q, &dip_terms);
            u_vertical -= dip_slip / (2.0 * PI) * chinnery(uz_dip_slip, x, p, length, width, q, &dip_terms);
        }
        if opening != 0.0 {
            u_x += opening / (2.0 * PI) * chinnery(ux_tensile, x, p, length, width, q, &dip_terms);
            u_y += opening / (2.0 * PI) * chinnery(uy_tensile, x, p, length, width, q, &dip_terms);
            u_vertical += opening / (2.0 * PI) * chinnery(uz_tensile, x, p, length, width, q, &dip_terms);
        }

        // Rotate from Okada's axes back to geographic
        u_e[i_station] = sin_strike * u_x - cos_strike * u_y;
        u_n[i_station] = cos_strike * u_x + sin_strike * u_y;
        u_z[i_station] = u_vertical;
    }

    return (u_e, u_n, u_z);
}

/// Chinnery's notation: f(x, p) - f(x, p - W) - f(x - L, p) + f(x - L, p - W)
fn chinnery(f: fn(f64, f64, f64, &DipTerms) -> f64, x: f64, p: f64, length: f64, width: f64, q: f64, dip_terms: &DipTerms) -> f64 {
    return f(x, p, q, dip_terms) - f(x, p - width, q, dip_terms) - f(x - length, p, q, dip_terms) + f(x - length, p - width, q, dip_terms);
}

fn atan_term(xi: f64, eta: f64, q: f64, r: f64) -> f64 {
    if q == 0.0 {
        return 0.0;
    }
    return (xi * eta / (q * r)).atan();
}

fn radius(xi: f64, eta: f64, q: f64) -> f64 {
    return (xi.powi(2) + eta.powi(2) + q.powi(2)).sqrt();
}

// Strike-slip, equation (25)
fn ux_strike_slip(xi: f64, eta: f64, q: f64, dt: &DipTerms) -> f64 {
    let r: f64 = radius(xi, eta, q);
    return xi * q / (r * (r + eta)) + i1(xi, eta, q, r, dt) * dt.sin_dip + atan_term(xi, eta, q, r);
}

fn uy_strike_slip(xi: f64, eta: f64, q: f64, dt: &DipTerms) -> f64 {
    let r: f64 = radius(xi, eta, q);
    let y_bar: f64 = eta * dt.cos_dip + q * dt.sin_dip;
    return y_bar * q / (r * (r + eta)) + q * dt.cos_dip / (r + eta) + i2(eta, q, r, dt) * dt.sin_dip;
}

fn uz_strike_slip(xi: f64, eta: f64, q: f64, dt: &DipTerms) -> f64 {
    let r: f64 = radius(xi, eta, q);
    let d_bar: f64 = eta * dt.sin_dip - q * dt.cos_dip;
    return d_bar * q / (r * (r + eta)) + q * dt.sin_dip / (r + eta) + i4(eta, q, r, dt) * dt.sin_dip;
}

// Dip-slip, equation (26)
fn ux_dip_slip(xi: f64, eta: f64, q: f64, dt: &DipTerms) -> f64 {
    let r: f64 = radius(xi, eta, q);
    return q / r - i3(eta, q, r, dt) * dt.sin_dip * dt.cos_dip;
}

fn uy_dip_slip(xi: f64, eta: f64, q: f64, dt: &DipTerms) -> f64 {
    let r: f64 = radius(xi, eta, q);
    let y_bar: f64 = eta * dt.cos_dip + q * dt.sin_dip;
    return y_bar * q / (r * (r + xi)) - i1(xi, eta, q, r, dt) * dt.sin_dip * dt.cos_dip + dt.cos_dip * atan_term(xi, eta, q, r);
}

fn uz_dip_slip(xi: f64, eta: f64, q: f64, dt: &DipTerms) -> f64 {
    let r: f64 = radius(xi, eta, q);
    let d_bar: f64 = eta * dt.sin_dip - q * dt.cos_dip;
    return d_bar * q / (r * (r + xi)) - i5(xi, eta, q, r, dt) * dt.sin_dip * dt.cos_dip + dt.sin_dip * atan_term(xi, eta, q, r);
}

// Tensile, equation (27)
fn ux_tensile(xi: f64, eta: f64, q: f64, dt: &DipTerms) -> f64 {
    let r: f64 = radius(xi, eta, q);
    return q.powi(2) / (r * (r + eta)) - i3(eta, q, r, dt) * dt.sin_dip.powi(2);
}

fn uy_tensile(xi: f64, eta: f64, q: f64, dt: &DipTerms) -> f64 {
    let r: f64 = radius(xi, eta, q);
    let d_bar: f64 = eta * dt.sin_dip - q * dt.cos_dip;
    return -d_bar * q / (r * (r + xi)) - dt.sin_dip * xi * q / (r * (r + eta)) - i1(xi, eta, q, r, dt) * dt.sin_dip.powi(2)
        + dt.sin_dip * atan_term(xi, eta, q, r);
}

fn uz_tensile(xi: f64, eta: f64, q: f64, dt: &DipTerms) -> f64 {
    let r: f64 = radius(xi, eta, q);
    let y_bar: f64 = eta * dt.cos_dip + q * dt.sin_dip;
    return y_bar * q / (r * (r + xi)) + dt.cos_dip * xi * q / (r * (r + eta)) - i5(xi, eta, q, r, dt) * dt.sin_dip.powi(2)
        - dt.cos_dip * atan_term(xi, eta, q, r);
}

// I-functions, equations (28) and (29)
fn i1(xi: f64, eta: f64, q: f64, r: f64, dt: &DipTerms) -> f64 {
    let d_bar: f64 = eta * dt.sin_dip - q * dt.cos_dip;
    if dt.is_vertical() {
        return -dt.one_minus_two_nu / 2.0 * xi * q / (r + d_bar).powi(2);
    }
    return dt.one_minus_two_nu * (-xi / (dt.cos_dip * (r + d_bar))) - dt.sin_dip / dt.cos_dip * i5(xi, eta, q, r, dt);
}

fn i2(eta: f64, q: f64, r: f64, dt: &DipTerms) -> f64 {
    return dt.one_minus_two_nu * (-(r + eta).ln()) - i3(eta, q, r, dt);
}

fn i3(eta: f64, q: f64, r: f64, dt: &DipTerms) -> f64 {
    let y_bar: f64 = eta * dt.cos_dip + q * dt.sin_dip;
    let d_bar: f64 = eta * dt.sin_dip - q * dt.cos_dip;
    if dt.is_vertical() {
        return dt.one_minus_two_nu / 2.0 * (eta / (r + d_bar) + y_bar * q / (r + d_bar).powi(2) - (r + eta).ln());
    }
    return dt.one_minus_two_nu * (y_bar / (dt.cos_dip * (r + d_bar)) - (r + eta).ln()) + dt.sin_dip / dt.cos_dip * i4(eta, q, r, dt);
}

fn i4(eta: f64, q: f64, r: f64, dt: &DipTerms) -> f64 {
    let d_bar: f64 = eta * dt.sin_dip - q * dt.cos_dip;
    if dt.is_vertical() {
        return -dt.one_minus_two_nu * q / (r + d_bar);
    }
    return dt.one_minus_two_nu / dt.cos_dip * ((r + d_bar).ln() - dt.sin_dip * (r + eta).ln());
}

fn i5(xi: f64, eta: f64, q: f64, r: f64, dt: &DipTerms) -> f64 {
    let d_bar: f64 = eta * dt.sin_dip - q * dt.cos_dip;
    if dt.is_vertical() {
        return -dt.one_minus_two_nu * xi * dt.sin_dip / (r + d_bar);
    }
    if xi == 0.0 {
        return 0.0;
    }
    let x: f64 = (xi.powi(2) + q.powi(2)).sqrt();
    return dt.one_minus_two_nu * 2.0 / dt.cos_dip
        * ((eta * (x + q * dt.cos_dip) + x * (r + x) * dt.sin_dip) / (xi * (r + x) * dt.cos_dip)).atan();
}

#[test]
fn test_okada85_vertical_dike_symmetry() {
    // A vertical opening dike pushes the two sides apart symmetrically
    use approx::assert_abs_diff_eq;

    let e: Array1<f64> = Array1::from(vec![1500.0, -1500.0, 400.0, -400.0]);
    let n: Array1<f64> = Array1::from(vec![700.0, 700.0, -2500.0, -2500.0]);

    let (u_e, u_n, u_z): (Array1<f64>, Array1<f64>, Array1<f64>) = okada85(&e, &n, 2000.0, 0.0, 90.0, 3000.0, 1000.0, 0.0, 0.0, 1.0, 0.25);

    let precision: f64 = 1e-10;
    for i_pair in [0, 2] {
        // Perpendicular motion is antisymmetric, the rest is symmetric
        assert_abs_diff_eq!(u_e[i_pair], -u_e[i_pair + 1], epsilon = precision);
        assert_abs_diff_eq!(u_n[i_pair], u_n[i_pair + 1], epsilon = precision);
        assert_abs_diff_eq!(u_z[i_pair], u_z[i_pair + 1], epsilon = precision);

        // Stations are pushed away from the dike plane
        assert!(u_e[i_pair] > 0.0);
    }
}

#[test]
fn test_okada85_on_strike_line_no_perpendicular_motion() {
    use approx::assert_abs_diff_eq;

    let e: Array1<f64> = Array1::from(vec![0.0, 0.0, 0.0]);
    let n: Array1<f64> = Array1::from(vec![0.0, 800.0, 5000.0]);

    let (u_e, _u_n, _u_z): (Array1<f64>, Array1<f64>, Array1<f64>) =
        okada85(&e, &n, 2000.0, 0.0, 90.0, 3000.0, 1000.0, 0.0, 0.0, 1.0, 0.25);

    for i_station in 0..3 {
        assert_abs_diff_eq!(u_e[i_station], 0.0, epsilon = 1e-10);
    }
}

#[test]
fn test_okada85_rotating_strike_rotates_displacement() {
    // Rotating the whole problem by 90 degrees rotates the horizontal displacement with it
    use approx::assert_abs_diff_eq;

    let e: Array1<f64> = Array1::from(vec![1200.0, -300.0]);
    let n: Array1<f64> = Array1::from(vec![500.0, 2200.0]);
    // Same stations, rotated 90 degrees clockwise: (e, n) -> (n, -e)
    let e_rotated: Array1<f64> = n.clone();
    let n_rotated: Array1<f64> = -&e;

    for (strike_slip, dip_slip, opening, dip) in [(1.0, 0.0, 0.0, 60.0), (0.0, 1.0, 0.0, 45.0), (0.0, 0.0, 1.0, 90.0)] {
        let (u_e, u_n, u_z): (Array1<f64>, Array1<f64>, Array1<f64>) =
            okada85(&e, &n, 3000.0, 20.0, dip, 4000.0, 1500.0, strike_slip, dip_slip, opening, 0.25);
        let (u_e_rotated, u_n_rotated, u_z_rotated): (Array1<f64>, Array1<f64>, Array1<f64>) =
            okada85(&e_rotated, &n_rotated, 3000.0, 110.0, dip, 4000.0, 1500.0, strike_slip, dip_slip, opening, 0.25);

        let precision: f64 = 1e-10;
        for i_station in 0..2 {
            assert_abs_diff_eq!(u_e_rotated[i_station], u_n[i_station], epsilon = precision);
            assert_abs_diff_eq!(u_n_rotated[i_station], -u_e[i_station], epsilon = precision);
            assert_abs_diff_eq!(u_z_rotated[i_station], u_z[i_station], epsilon = precision);
        }
    }
}

#[test]
fn test_okada85_far_field_decays() {
    let e: Array1<f64> = Array1::from(vec![2000.0, 200_000.0]);
    let n: Array1<f64> = Array1::from(vec![0.0, 0.0]);

    let (u_e, _u_n, u_z): (Array1<f64>, Array1<f64>, Array1<f64>) =
        okada85(&e, &n, 2000.0, 0.0, 90.0, 3000.0, 1000.0, 0.0, 0.0, 1.0, 0.25);

    assert!(u_e[1].abs() < 1e-2 * u_e[0].abs());
    assert!(u_z[1].abs() < 1e-2 * u_z[0].abs());
}
