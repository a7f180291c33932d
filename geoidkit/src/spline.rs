//! Bicubic spline interpolation over a regular geoid grid.
//!
//! The surface is the tensor product of cubic interpolating splines with
//! not-a-knot end conditions along each axis. This is the surface produced by
//! a FITPACK rectangular bivariate spline of degree 3 with zero smoothing, so
//! values agree with tools built on `RectBivariateSpline`.
//!
//! # Representation
//!
//! A 1-D cubic spline on one interval is fixed by the node values and the
//! node second derivatives. For the tensor product each grid cell is fixed by
//! four quantities per corner:
//!
//! - `f`: the sample
//! - `f_lat_lat`: second derivative along latitude
//! - `f_lon_lon`: second derivative along longitude
//! - `f_lat_lat_lon_lon`: the mixed fourth derivative
//!
//! All three derivative arrays are computed once when the spline is built,
//! which turns every evaluation into a constant-time patch evaluation.

use crate::error::{GeoidError, Result};
use crate::grid::{GridDataset, GridHeader};

/// Interpolating bicubic spline over a [`GridDataset`].
///
/// # Example
///
/// ```ignore
/// use geoidkit::{BicubicSpline, GridDataset};
///
/// let grid = GridDataset::from_file("g2018u1.asc")?;
/// let spline = BicubicSpline::new(grid);
/// let n = spline.evaluate(46.722092, -119.593764)?;
/// ```
#[derive(Debug, Clone)]
pub struct BicubicSpline {
    grid: GridDataset,
    d2_lat: Vec<f64>,
    d2_lon: Vec<f64>,
    d4_lat_lon: Vec<f64>,
}

impl BicubicSpline {
    /// Build the spline for a grid.
    ///
    /// Construction is deterministic and costs a few passes over the samples.
    pub fn new(grid: GridDataset) -> Self {
        let h = *grid.header();
        let d2_lat = along_columns(grid.samples(), h.n_rows, h.n_cols, h.dlat);
        let d2_lon = along_rows(grid.samples(), h.n_rows, h.n_cols, h.dlon);
        let d4_lat_lon = along_rows(&d2_lat, h.n_rows, h.n_cols, h.dlon);

        Self {
            grid,
            d2_lat,
            d2_lon,
            d4_lat_lon,
        }
    }

    /// Evaluate the surface at a point.
    ///
    /// # Errors
    ///
    /// Returns [`GeoidError::OutOfGridBounds`] if the point lies outside
    /// `[lat0, lat_max] × [lon0, lon_max]`. The spline is never extrapolated.
    pub fn evaluate(&self, lat: f64, lon: f64) -> Result<f64> {
        let h = self.grid.header();
        if !h.contains(lat, lon) {
            return Err(GeoidError::OutOfGridBounds { lat, lon });
        }

        let (i, wlat) = CellWeights::locate(lat - h.lat0, h.dlat, h.n_rows);
        let (j, wlon) = CellWeights::locate(lon - h.lon0, h.dlon, h.n_cols);

        let samples = self.grid.samples();
        let along_lon = |row: usize, values: &[f64], d2: &[f64]| {
            let k = row * h.n_cols + j;
            wlon.apply(values[k], values[k + 1], d2[k], d2[k + 1])
        };

        let f0 = along_lon(i, samples, &self.d2_lon);
        let f1 = along_lon(i + 1, samples, &self.d2_lon);
        let m0 = along_lon(i, &self.d2_lat, &self.d4_lat_lon);
        let m1 = along_lon(i + 1, &self.d2_lat, &self.d4_lat_lon);

        Ok(wlat.apply(f0, f1, m0, m1))
    }

    /// Returns the underlying grid.
    pub fn grid(&self) -> &GridDataset {
        &self.grid
    }

    /// Returns the grid header.
    pub fn header(&self) -> &GridHeader {
        self.grid.header()
    }
}

/// Cubic spline weights for a position inside one interval.
struct CellWeights {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl CellWeights {
    /// Find the interval holding `offset` (distance from the first node) and
    /// the weights of its two end values and two end second derivatives.
    fn locate(offset: f64, h: f64, n: usize) -> (usize, Self) {
        let u = offset / h;
        let cell = (u.floor() as usize).min(n - 2);
        let t = u - cell as f64;
        let a = 1.0 - t;
        let h2 = h * h / 6.0;
        (
            cell,
            Self {
                a,
                b: t,
                c: (a * a * a - a) * h2,
                d: (t * t * t - t) * h2,
            },
        )
    }

    fn apply(&self, y0: f64, y1: f64, m0: f64, m1: f64) -> f64 {
        self.a * y0 + self.b * y1 + self.c * m0 + self.d * m1
    }
}

/// Second derivatives of the not-a-knot spline along every row.
fn along_rows(values: &[f64], n_rows: usize, n_cols: usize, h: f64) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    let mut work = Vec::with_capacity(n_cols);
    for r in 0..n_rows {
        let span = r * n_cols..(r + 1) * n_cols;
        second_derivatives(&values[span.clone()], h, &mut out[span], &mut work);
    }
    out
}

/// Second derivatives of the not-a-knot spline along every column.
fn along_columns(values: &[f64], n_rows: usize, n_cols: usize, h: f64) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    let mut column = vec![0.0; n_rows];
    let mut m = vec![0.0; n_rows];
    let mut work = Vec::with_capacity(n_rows);
    for c in 0..n_cols {
        for (r, v) in column.iter_mut().enumerate() {
            *v = values[r * n_cols + c];
        }
        second_derivatives(&column, h, &mut m, &mut work);
        for (r, v) in m.iter().enumerate() {
            out[r * n_cols + c] = *v;
        }
    }
    out
}

/// Node second derivatives `m` of the not-a-knot cubic spline through the
/// equally spaced values `y` (spacing `h`, at least 4 nodes).
///
/// With equal spacing the not-a-knot conditions `m[0] = 2m[1] - m[2]` and
/// `m[n-1] = 2m[n-2] - m[n-3]` fold into the first and last interior rows,
/// which become `6 m[1] = r[1]` and `6 m[n-2] = r[n-2]`. The remaining rows are
/// the usual `m[i-1] + 4 m[i] + m[i+1] = r[i]`, solved with the Thomas
/// algorithm. `work` holds the modified super-diagonal.
fn second_derivatives(y: &[f64], h: f64, m: &mut [f64], work: &mut Vec<f64>) {
    let n = y.len();
    debug_assert!(n >= 4 && m.len() == n);

    let unknowns = n - 2;
    let scale = 6.0 / (h * h);
    work.clear();
    work.resize(unknowns, 0.0);

    // Forward sweep; m[node] temporarily holds the modified right-hand side.
    for r in 0..unknowns {
        let node = r + 1;
        let rhs = scale * (y[node - 1] - 2.0 * y[node] + y[node + 1]);
        let (sub, diag, sup) = if r == 0 || r == unknowns - 1 {
            (0.0, 6.0, 0.0)
        } else {
            (1.0, 4.0, 1.0)
        };
        let (c_prev, d_prev) = if r == 0 {
            (0.0, 0.0)
        } else {
            (work[r - 1], m[node - 1])
        };
        let denom = diag - sub * c_prev;
        work[r] = sup / denom;
        m[node] = (rhs - sub * d_prev) / denom;
    }

    for r in (0..unknowns - 1).rev() {
        m[r + 1] -= work[r] * m[r + 2];
    }

    m[0] = 2.0 * m[1] - m[2];
    m[n - 1] = 2.0 * m[n - 2] - m[n - 3];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SampleKind;

    fn header(lat0: f64, lon0: f64, dlat: f64, dlon: f64, rows: usize, cols: usize) -> GridHeader {
        GridHeader {
            lat0,
            lon0,
            dlat,
            dlon,
            n_rows: rows,
            n_cols: cols,
            kind: SampleKind::Real4,
        }
    }

    fn build(h: GridHeader, f: impl Fn(f64, f64) -> f64) -> BicubicSpline {
        let mut samples = Vec::with_capacity(h.n_rows * h.n_cols);
        for i in 0..h.n_rows {
            for j in 0..h.n_cols {
                samples.push(f(
                    h.lat0 + i as f64 * h.dlat,
                    h.lon0 + j as f64 * h.dlon,
                ));
            }
        }
        BicubicSpline::new(GridDataset::new(h, samples).unwrap())
    }

    /// Cubic in each axis, so the not-a-knot spline reproduces it exactly.
    fn bicubic(lat: f64, lon: f64) -> f64 {
        let x = lat - 40.0;
        let y = lon + 130.0;
        0.01 * x * x * x - 0.2 * x * x * y + 0.05 * y * y * y + 0.3 * x * y * y * y / 10.0 + x
            - 3.0
    }

    #[test]
    fn test_interpolates_nodes() {
        let spline = build(header(40.0, -130.0, 0.5, 0.25, 9, 11), |lat, lon| {
            (lat * 1.3).sin() * 12.0 - (lon * 0.7).cos() * 8.0 - 25.0
        });
        let grid = spline.grid();
        for i in 0..9 {
            for j in 0..11 {
                let v = spline.evaluate(grid.lat_at(i), grid.lon_at(j)).unwrap();
                assert!(
                    (v - grid.sample(i, j).unwrap()).abs() < 1e-9,
                    "node ({}, {}) gave {}",
                    i,
                    j,
                    v
                );
            }
        }
    }

    #[test]
    fn test_reproduces_bicubic_polynomials() {
        let spline = build(header(40.0, -130.0, 1.0, 1.0, 8, 9), bicubic);
        for &(lat, lon) in &[
            (40.3, -129.9),
            (43.77, -125.2),
            (46.5, -122.5),
            (47.0, -122.0),
            (41.05, -123.95),
        ] {
            let v = spline.evaluate(lat, lon).unwrap();
            assert!(
                (v - bicubic(lat, lon)).abs() < 1e-8,
                "at ({}, {}): {} vs {}",
                lat,
                lon,
                v,
                bicubic(lat, lon)
            );
        }
    }

    #[test]
    fn test_four_by_four_is_lagrange_interpolant() {
        // With four nodes per axis the not-a-knot spline is the single cubic
        // through them, whose midpoint weights are (-1, 9, 9, -1) / 16.
        let values = [
            [3.0, -1.0, 4.0, 1.0],
            [-5.0, 9.0, 2.0, 6.0],
            [5.0, 3.0, -5.0, 8.0],
            [9.0, 7.0, 9.0, -3.0],
        ];
        let h = header(30.0, -100.0, 1.0, 1.0, 4, 4);
        let samples: Vec<f64> = values.iter().flatten().copied().collect();
        let spline = BicubicSpline::new(GridDataset::new(h, samples).unwrap());

        let w = [-1.0 / 16.0, 9.0 / 16.0, 9.0 / 16.0, -1.0 / 16.0];
        let mut expected = 0.0;
        for i in 0..4 {
            for j in 0..4 {
                expected += w[i] * w[j] * values[i][j];
            }
        }

        let v = spline.evaluate(31.5, -98.5).unwrap();
        assert!((v - expected).abs() < 1e-12, "{} vs {}", v, expected);
    }

    #[test]
    fn test_grid_edges_are_inside_support() {
        let spline = build(header(24.0, -96.0, 0.5, 0.5, 5, 6), bicubic);
        let h = *spline.header();
        assert!(spline.evaluate(h.lat0, h.lon0).is_ok());
        assert!(spline.evaluate(h.lat_max(), h.lon_max()).is_ok());
        assert!(spline.evaluate(h.lat_max(), h.lon0).is_ok());
    }

    #[test]
    fn test_rejects_points_outside_support() {
        let spline = build(header(24.0, -96.0, 0.5, 0.5, 5, 6), bicubic);
        for &(lat, lon) in &[
            (23.999, -95.0),
            (26.001, -95.0),
            (25.0, -96.001),
            (25.0, -93.499),
            (f64::NAN, -95.0),
        ] {
            match spline.evaluate(lat, lon) {
                Err(GeoidError::OutOfGridBounds { .. }) => {}
                other => panic!("({}, {}) gave {:?}", lat, lon, other),
            }
        }
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let spline = build(header(40.0, -79.0, 0.25, 0.25, 20, 20), |lat, lon| {
            (lat * 2.1).cos() * 5.0 + (lon * 1.7).sin() * 3.0 - 30.0
        });
        let a = spline.evaluate(42.123, -76.456).unwrap();
        let b = spline.evaluate(42.123, -76.456).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
        assert!(a.is_finite());
    }

    #[test]
    fn test_surface_is_continuous_across_cells() {
        let spline = build(header(40.0, -79.0, 0.25, 0.25, 12, 12), |lat, lon| {
            (lat * 3.0).sin() * 4.0 + (lon * 2.0).cos() * 2.0
        });
        let eps = 1e-9;
        let edge_lat = 40.0 + 5.0 * 0.25;
        let lon = -77.3;
        let below = spline.evaluate(edge_lat - eps, lon).unwrap();
        let above = spline.evaluate(edge_lat + eps, lon).unwrap();
        assert!((below - above).abs() < 1e-6);
    }

    #[test]
    fn test_second_derivatives_of_cubic() {
        // y = x^3 on x = 0..5: y'' = 6x exactly.
        let y: Vec<f64> = (0..6).map(|x| (x as f64).powi(3)).collect();
        let mut m = vec![0.0; 6];
        let mut work = Vec::new();
        second_derivatives(&y, 1.0, &mut m, &mut work);
        for (x, v) in m.iter().enumerate() {
            assert!((v - 6.0 * x as f64).abs() < 1e-10, "m[{}] = {}", x, v);
        }
    }
}
