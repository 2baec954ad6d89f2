//! Lid-driven cavity run
//!
//! Owns a lattice configured for the cavity problem and drives it through the
//! whole iteration budget: macroscopic recovery, field output and one
//! `advance` per iteration, then the centreline comparison and a final
//! streamline rendering.

use crate::config::{CavityConfig, RunParameters};
use crate::error::{LatticeError, RunError};
use crate::lattice::Lattice;
use crate::output::{write_centerline_profiles, FieldWriter, OutputOptions};
use crate::validation::CavityError;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Timesteps performed
    pub iterations: u64,
    /// Wall time of the time loop
    pub elapsed: Duration,
    /// Million lattice-node updates per second
    pub mlups: f64,
    /// Centreline error, when a benchmark table exists for the Reynolds number
    pub error: Option<CavityError>,
}

/// A cavity run in progress
pub struct CavitySimulation {
    config: CavityConfig,
    params: RunParameters,
    lattice: Lattice,
    writer: Option<FieldWriter>,
}

impl CavitySimulation {
    /// Derive the run parameters and set up the cavity initial condition
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the configuration cannot be turned into a
    /// stable lattice
    pub fn new(config: CavityConfig) -> Result<Self, LatticeError> {
        let params = config.derive()?;
        let mut lattice = Lattice::new(params.lattice)?;
        lattice.set_cavity(params.lattice.u_lbm);

        info!(
            "Cavity: Re = {}, u_lid = {}, {}x{} nodes, tau = {:.4}, {} iterations",
            params.lattice.re_lbm,
            params.lattice.u_lbm,
            lattice.width(),
            lattice.height(),
            params.lattice.tau_lbm,
            params.it_max + 1
        );

        let writer = FieldWriter::new(&config.output_dir, config.image_size);
        Ok(Self {
            config,
            params,
            lattice,
            writer: Some(writer),
        })
    }

    /// Disable every file output
    #[must_use]
    pub fn without_output(mut self) -> Self {
        self.writer = None;
        self
    }

    /// Current lattice
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Derived parameters
    pub fn params(&self) -> &RunParameters {
        &self.params
    }

    /// Configuration this run was built from
    pub fn config(&self) -> &CavityConfig {
        &self.config
    }

    /// Run every iteration, then write profiles, the error and streamlines
    ///
    /// # Errors
    ///
    /// Stops at the first closure defect, divergence or output failure
    pub fn run(&mut self) -> Result<RunSummary, RunError> {
        self.run_with_progress(|_, _| {})
    }

    /// Same as [`run`](Self::run), calling `progress(iteration, total)` after each step
    pub fn run_with_progress(
        &mut self,
        mut progress: impl FnMut(u64, u64),
    ) -> Result<RunSummary, RunError> {
        let total = self.params.it_max + 1;
        let frequency = self.params.output_freq;
        let options = OutputOptions {
            velocity_norm: true,
            streamlines: false,
        };

        let start = Instant::now();
        for it in 0..total {
            self.lattice.recover_macroscopic()?;

            if let Some(writer) = &self.writer {
                writer.output_fields(&self.lattice, it, frequency, options)?;
            }
            if it % frequency == 0 {
                debug!(
                    "Iteration {}/{}: mass {:.6}",
                    it,
                    total,
                    self.lattice.total_mass()
                );
            }

            self.lattice.advance()?;
            progress(it + 1, total);
        }
        let elapsed = start.elapsed();

        self.lattice.recover_macroscopic()?;
        let error = self.finish()?;

        let nodes = (self.lattice.width() * self.lattice.height()) as f64;
        let secs = elapsed.as_secs_f64();
        let mlups = if secs > 0.0 {
            nodes * total as f64 / secs / 1e6
        } else {
            0.0
        };

        info!(
            "Finished {} iterations in {:.2}s ({:.1} MLUPS)",
            total, secs, mlups
        );
        trace!("Stage timings: {}", self.lattice.timings());

        Ok(RunSummary {
            iterations: total,
            elapsed,
            mlups,
            error,
        })
    }

    /// Final outputs: centreline profiles, benchmark error, streamlines
    fn finish(&self) -> Result<Option<CavityError>, RunError> {
        let u_lid = self.params.lattice.u_lbm;

        if let Some(writer) = &self.writer {
            let profiles = self.lattice.centerline_profiles(u_lid)?;
            write_centerline_profiles(writer.dir(), &profiles)?;
        }

        let error = match self.lattice.compute_error(u_lid) {
            Ok(error) => {
                info!(
                    "Centreline L2 error vs Ghia et al.: ux {:.4}, uy {:.4}, combined {:.4}",
                    error.ux, error.uy, error.combined
                );
                Some(error)
            }
            Err(LatticeError::NoReference { .. }) => None,
            Err(err) => return Err(err.into()),
        };

        if let Some(writer) = &self.writer {
            let options = OutputOptions {
                velocity_norm: false,
                streamlines: true,
            };
            writer.output_fields(&self.lattice, 1, 1, options)?;
        }

        Ok(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config() -> CavityConfig {
        CavityConfig {
            reynolds: 100.0,
            lid_velocity: 0.1,
            length: 20,
            t_max: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_counts_iterations_and_reports_error() {
        let mut sim = CavitySimulation::new(short_config()).unwrap().without_output();
        let expected = sim.params().it_max + 1;

        let mut calls = 0;
        let summary = sim.run_with_progress(|_, _| calls += 1).unwrap();

        assert_eq!(summary.iterations, expected);
        assert_eq!(calls, expected);
        assert_eq!(sim.lattice().iteration(), expected);
        assert!(summary.error.is_some());
        assert!(summary.mlups >= 0.0);
    }

    #[test]
    fn test_run_without_reference_has_no_error() {
        let config = CavityConfig {
            reynolds: 250.0,
            ..short_config()
        };
        let summary = CavitySimulation::new(config)
            .unwrap()
            .without_output()
            .run()
            .unwrap();
        assert!(summary.error.is_none());
    }

    #[test]
    fn test_run_writes_outputs() {
        let dir = std::env::temp_dir().join(format!("lbm_cavity_run_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let config = CavityConfig {
            output_dir: dir.clone(),
            output_freq: 10,
            image_size: 32,
            ..short_config()
        };
        let mut sim = CavitySimulation::new(config).unwrap();
        sim.run().unwrap();

        assert!(dir.join("u_norm_0.png").exists());
        assert!(dir.join("u_stream.png").exists());
        assert!(dir.join("cavity_ux").exists());
        assert!(dir.join("cavity_uy").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_config_fails_before_running() {
        let config = CavityConfig {
            length: 0,
            ..short_config()
        };
        assert!(CavitySimulation::new(config).is_err());
    }
}
