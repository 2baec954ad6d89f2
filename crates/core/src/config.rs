//! Run configuration
//!
//! `CavityConfig` holds the free parameters of a lid-driven cavity run (the
//! ones a user picks). `CavityConfig::derive` turns them into the immutable
//! `RunParameters` consumed by the engine and the driver:
//!
//! ```text
//! nx  = L
//! ν   = u·L / Re
//! τ   = ½ + ν / cs²
//! dt  = Re·ν / L²       (one lid traversal per unit of time)
//! it  = ⌊t_max / dt⌋
//! ```

use crate::error::{LatticeError, OutputError};
use crate::lattice::geometry::CS2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lid speeds above this are outside the low-Mach regime of the scheme
pub const MAX_RECOMMENDED_LID_VELOCITY: f64 = 0.1;

/// Free parameters of a cavity run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CavityConfig {
    /// Reynolds number
    pub reynolds: f64,
    /// Lid velocity in lattice units
    pub lid_velocity: f64,
    /// Cavity side in lattice nodes
    pub length: usize,
    /// Physical end time, in lid traversals
    pub t_max: f64,
    /// Reference density in lattice units
    pub rho: f64,
    /// Write field output every `output_freq` iterations
    pub output_freq: u64,
    /// Side of the written images in pixels
    pub image_size: u32,
    /// Directory receiving images and profiles
    pub output_dir: PathBuf,
}

impl Default for CavityConfig {
    fn default() -> Self {
        Self {
            reynolds: 100.0,
            lid_velocity: 0.03,
            length: 200,
            t_max: 20.0,
            rho: 1.0,
            output_freq: 500,
            image_size: 512,
            output_dir: PathBuf::from("results"),
        }
    }
}

/// Parameters of the lattice engine, fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticeParameters {
    /// Last node index along x (the grid has `nx + 1` nodes)
    pub nx: usize,
    /// Last node index along y
    pub ny: usize,
    /// Node spacing in physical units
    pub dx: f64,
    /// Timestep in physical units
    pub dt: f64,
    /// Symmetric relaxation time
    pub tau_lbm: f64,
    /// Reynolds number
    pub re_lbm: f64,
    /// Lid velocity in lattice units
    pub u_lbm: f64,
    /// Characteristic length in lattice units
    pub l_lbm: usize,
    /// Kinematic viscosity in lattice units
    pub nu_lbm: f64,
    /// Reference density
    pub rho_lbm: f64,
    /// Side of output images in pixels
    pub output_resolution: u32,
}

impl LatticeParameters {
    /// Check every invariant the engine relies on
    ///
    /// Pure check with no logging; high lid speeds are accepted here and
    /// reported once by `Lattice::new`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending parameter
    pub fn validate(&self) -> Result<(), LatticeError> {
        if self.nx < 2 {
            return Err(LatticeError::invalid_config(
                "nx",
                format!("must be at least 2, got {}", self.nx),
            ));
        }
        if self.ny < 2 {
            return Err(LatticeError::invalid_config(
                "ny",
                format!("must be at least 2, got {}", self.ny),
            ));
        }
        if !self.tau_lbm.is_finite() || self.tau_lbm <= 0.5 {
            return Err(LatticeError::invalid_config(
                "tau_lbm",
                format!(
                    "must exceed 0.5 for a stable scheme, got {}",
                    self.tau_lbm
                ),
            ));
        }
        for (name, value) in [("dx", self.dx), ("dt", self.dt), ("rho_lbm", self.rho_lbm)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LatticeError::invalid_config(
                    name,
                    format!("must be finite and positive, got {value}"),
                ));
            }
        }
        for (name, value) in [
            ("u_lbm", self.u_lbm),
            ("re_lbm", self.re_lbm),
            ("nu_lbm", self.nu_lbm),
        ] {
            if !value.is_finite() {
                return Err(LatticeError::invalid_config(
                    name,
                    format!("must be finite, got {value}"),
                ));
            }
        }
        Ok(())
    }

    /// Whether the lid speed stays within [`MAX_RECOMMENDED_LID_VELOCITY`]
    pub fn is_low_mach(&self) -> bool {
        self.u_lbm.abs() <= MAX_RECOMMENDED_LID_VELOCITY
    }
}

/// Everything derived from a `CavityConfig`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParameters {
    /// Engine parameters
    pub lattice: LatticeParameters,
    /// Index of the last iteration; the loop runs `it_max + 1` times
    pub it_max: u64,
    /// Output cadence in iterations
    pub output_freq: u64,
}

impl CavityConfig {
    /// Derive the engine parameters and iteration budget
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when a free parameter is out of range or a
    /// derived one (viscosity, relaxation time, timestep) is not usable
    pub fn derive(&self) -> Result<RunParameters, LatticeError> {
        if !self.reynolds.is_finite() || self.reynolds <= 0.0 {
            return Err(LatticeError::invalid_config(
                "reynolds",
                format!("must be finite and positive, got {}", self.reynolds),
            ));
        }
        if !self.lid_velocity.is_finite() || self.lid_velocity <= 0.0 {
            return Err(LatticeError::invalid_config(
                "lid_velocity",
                format!("must be finite and positive, got {}", self.lid_velocity),
            ));
        }
        if self.length < 2 {
            return Err(LatticeError::invalid_config(
                "length",
                format!("must be at least 2 nodes, got {}", self.length),
            ));
        }
        if !self.t_max.is_finite() || self.t_max < 0.0 {
            return Err(LatticeError::invalid_config(
                "t_max",
                format!("must be finite and non-negative, got {}", self.t_max),
            ));
        }
        if self.output_freq == 0 {
            return Err(LatticeError::invalid_config("output_freq", "must be positive"));
        }

        let length = self.length as f64;
        let nu_lbm = self.lid_velocity * length / self.reynolds;
        let tau_lbm = 0.5 + nu_lbm / CS2;
        let dt = self.reynolds * nu_lbm / (length * length);
        let it_max = (self.t_max / dt).floor();
        if !it_max.is_finite() {
            return Err(LatticeError::invalid_config(
                "t_max",
                format!("gives a non-finite iteration count with dt = {dt}"),
            ));
        }

        let lattice = LatticeParameters {
            nx: self.length,
            ny: self.length,
            dx: 1.0 / length,
            dt,
            tau_lbm,
            re_lbm: self.reynolds,
            u_lbm: self.lid_velocity,
            l_lbm: self.length,
            nu_lbm,
            rho_lbm: self.rho,
            output_resolution: self.image_size,
        };
        lattice.validate()?;

        Ok(RunParameters {
            lattice,
            it_max: it_max as u64,
            output_freq: self.output_freq,
        })
    }

    /// Load a configuration from a JSON file; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save the configuration as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), OutputError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
