//! Comparison against the Ghia, Ghia & Shin (1982) cavity benchmark
//!
//! The reference tables give the x-velocity along the vertical centreline
//! (`x = 1/2`) and the y-velocity along the horizontal centreline (`y = 1/2`),
//! both normalised by the lid speed, for Re = 100, 400 and 1000.

use crate::error::LatticeError;
use crate::lattice::Lattice;
use tracing::{debug, warn};

/// Sample heights of the vertical-centreline table
const GHIA_Y: [f64; 17] = [
    1.0, 0.9766, 0.9688, 0.9609, 0.9531, 0.8516, 0.7344, 0.6172, 0.5, 0.4531, 0.2813, 0.1719,
    0.1016, 0.0703, 0.0625, 0.0547, 0.0,
];

/// Sample abscissae of the horizontal-centreline table
const GHIA_X: [f64; 17] = [
    1.0, 0.9688, 0.9609, 0.9531, 0.9453, 0.9063, 0.8594, 0.8047, 0.5, 0.2344, 0.2266, 0.1563,
    0.0938, 0.0781, 0.0703, 0.0625, 0.0,
];

const GHIA_U_100: [f64; 17] = [
    1.0, 0.84123, 0.78871, 0.73722, 0.68717, 0.23151, 0.00332, -0.13641, -0.20581, -0.21090,
    -0.15662, -0.10150, -0.06434, -0.04775, -0.04192, -0.03717, 0.0,
];

const GHIA_V_100: [f64; 17] = [
    0.0, -0.05906, -0.07391, -0.08864, -0.10313, -0.16914, -0.22445, -0.24533, 0.05454, 0.17527,
    0.17507, 0.16077, 0.12317, 0.10890, 0.10091, 0.09233, 0.0,
];

const GHIA_U_400: [f64; 17] = [
    1.0, 0.75837, 0.68439, 0.61756, 0.55892, 0.29093, 0.16256, 0.02135, -0.11477, -0.17119,
    -0.32726, -0.24299, -0.14612, -0.10338, -0.09266, -0.08186, 0.0,
];

const GHIA_V_400: [f64; 17] = [
    0.0, -0.12146, -0.15663, -0.19254, -0.22847, -0.23827, -0.44993, -0.38598, 0.05186, 0.30174,
    0.30203, 0.28124, 0.22965, 0.20920, 0.19713, 0.18360, 0.0,
];

const GHIA_U_1000: [f64; 17] = [
    1.0, 0.65928, 0.57492, 0.51117, 0.46604, 0.33304, 0.18719, 0.05702, -0.06080, -0.10648,
    -0.27805, -0.38289, -0.29730, -0.22220, -0.20196, -0.18109, 0.0,
];

const GHIA_V_1000: [f64; 17] = [
    0.0, -0.21388, -0.27669, -0.33714, -0.39188, -0.51550, -0.42665, -0.31966, 0.02526, 0.32235,
    0.33075, 0.37095, 0.32627, 0.30353, 0.29012, 0.27485, 0.0,
];

/// One row of the benchmark
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GhiaReference {
    /// Reynolds number of the table
    pub reynolds: f64,
    /// Heights of the `ux` samples
    pub y: &'static [f64],
    /// Normalised `ux` on the vertical centreline
    pub ux: &'static [f64],
    /// Abscissae of the `uy` samples
    pub x: &'static [f64],
    /// Normalised `uy` on the horizontal centreline
    pub uy: &'static [f64],
}

impl GhiaReference {
    /// Every tabulated Reynolds number
    pub const AVAILABLE: [f64; 3] = [100.0, 400.0, 1000.0];

    /// Table for `reynolds`, if one exists
    pub fn for_reynolds(reynolds: f64) -> Option<Self> {
        let (ux, uy): (&'static [f64], &'static [f64]) = match reynolds {
            r if is_close(r, 100.0) => (&GHIA_U_100, &GHIA_V_100),
            r if is_close(r, 400.0) => (&GHIA_U_400, &GHIA_V_400),
            r if is_close(r, 1000.0) => (&GHIA_U_1000, &GHIA_V_1000),
            _ => return None,
        };
        Some(Self {
            reynolds,
            y: &GHIA_Y,
            ux,
            x: &GHIA_X,
            uy,
        })
    }
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs()
}

/// Simulated centreline velocities, normalised by the lid speed
#[derive(Debug, Clone, PartialEq)]
pub struct CenterlineProfiles {
    /// Node spacing along both axes
    pub spacing: f64,
    /// `ux / u_lid` on the vertical centreline, indexed by `j`
    pub ux: Vec<f64>,
    /// `uy / u_lid` on the horizontal centreline, indexed by `i`
    pub uy: Vec<f64>,
}

impl CenterlineProfiles {
    /// Extract both profiles from the current velocity field
    ///
    /// When the centreline falls between two node columns (odd `nx`) the two
    /// neighbours are averaged.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `u_lid` is not finite and positive
    pub fn from_lattice(lattice: &Lattice, u_lid: f64) -> Result<Self, LatticeError> {
        if !u_lid.is_finite() || u_lid <= 0.0 {
            return Err(LatticeError::invalid_config(
                "u_lid",
                format!("must be finite and positive to normalise profiles, got {u_lid}"),
            ));
        }
        let (width, height) = (lattice.width(), lattice.height());
        let scale = 1.0 / u_lid;

        let mid_i = centre_pair(width);
        let ux = (0..height)
            .map(|j| {
                let a = lattice.velocity_at(mid_i.0, j).x;
                let b = lattice.velocity_at(mid_i.1, j).x;
                0.5 * (a + b) * scale
            })
            .collect();

        let mid_j = centre_pair(height);
        let uy = (0..width)
            .map(|i| {
                let a = lattice.velocity_at(i, mid_j.0).y;
                let b = lattice.velocity_at(i, mid_j.1).y;
                0.5 * (a + b) * scale
            })
            .collect();

        Ok(Self {
            spacing: lattice.params().dx,
            ux,
            uy,
        })
    }
}

/// Node indices straddling the middle of `count` nodes (equal when `count` is odd)
fn centre_pair(count: usize) -> (usize, usize) {
    let last = count - 1;
    if last % 2 == 0 {
        (last / 2, last / 2)
    } else {
        (last / 2, last / 2 + 1)
    }
}

/// Linear interpolation of a uniformly sampled profile at `at`
///
/// Positions outside the sampled range clamp to the end values.
pub fn sample_profile(profile: &[f64], spacing: f64, at: f64) -> f64 {
    match profile.len() {
        0 => return 0.0,
        1 => return profile[0],
        _ => {}
    }
    let last = (profile.len() - 1) as f64;
    let s = (at / spacing).clamp(0.0, last);
    let k = (s.floor() as usize).min(profile.len() - 2);
    let t = s - k as f64;
    profile[k] * (1.0 - t) + profile[k + 1] * t
}

/// Squared error and squared reference norm of `profile` against a table
fn squared_sums(profile: &[f64], spacing: f64, positions: &[f64], reference: &[f64]) -> (f64, f64) {
    positions
        .iter()
        .zip(reference)
        .fold((0.0, 0.0), |(err, norm), (&at, &expected)| {
            let diff = sample_profile(profile, spacing, at) - expected;
            (err + diff * diff, norm + expected * expected)
        })
}

/// Normalised L2 errors of a run against the benchmark
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CavityError {
    /// Vertical centreline, x-velocity
    pub ux: f64,
    /// Horizontal centreline, y-velocity
    pub uy: f64,
    /// Both profiles pooled
    pub combined: f64,
}

impl CavityError {
    /// Compare `profiles` with `reference`
    pub fn from_profiles(profiles: &CenterlineProfiles, reference: &GhiaReference) -> Self {
        let (ex, nx) = squared_sums(&profiles.ux, profiles.spacing, reference.y, reference.ux);
        let (ey, ny) = squared_sums(&profiles.uy, profiles.spacing, reference.x, reference.uy);
        Self {
            ux: (ex / nx).sqrt(),
            uy: (ey / ny).sqrt(),
            combined: ((ex + ey) / (nx + ny)).sqrt(),
        }
    }
}

impl Lattice {
    /// Centreline velocity profiles normalised by `u_lid`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `u_lid` is not finite and positive
    pub fn centerline_profiles(&self, u_lid: f64) -> Result<CenterlineProfiles, LatticeError> {
        CenterlineProfiles::from_lattice(self, u_lid)
    }

    /// Normalised L2 error of the current velocity field against Ghia et al.
    ///
    /// # Errors
    ///
    /// Returns `NoReference` when the run's Reynolds number has no table, and
    /// `InvalidConfig` when `u_lid` is not finite and positive
    pub fn compute_error(&self, u_lid: f64) -> Result<CavityError, LatticeError> {
        let reynolds = self.params().re_lbm;
        let Some(reference) = GhiaReference::for_reynolds(reynolds) else {
            warn!(
                "No benchmark table for Re = {}; available: {:?}",
                reynolds,
                GhiaReference::AVAILABLE
            );
            return Err(LatticeError::NoReference { reynolds });
        };
        let error = CavityError::from_profiles(&self.centerline_profiles(u_lid)?, &reference);
        debug!(
            "Centreline error at Re = {}: ux {:.4}, uy {:.4}, combined {:.4}",
            reynolds, error.ux, error.uy, error.combined
        );
        Ok(error)
    }
}
