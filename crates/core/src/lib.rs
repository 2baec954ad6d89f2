//! Lattice Boltzmann Lid-Driven Cavity Core Library
//!
//! A D2Q9 lattice Boltzmann engine with two-relaxation-time (TRT) collisions
//! and Zou-He velocity boundaries, set up for the lid-driven cavity benchmark.
//!
//! ## Engine
//!
//! - [`lattice::Lattice`] holds populations, density and velocity on an
//!   `(nx + 1) × (ny + 1)` node grid and advances them one timestep per
//!   [`Lattice::advance`] call
//! - Equilibrium, collision and streaming run in parallel over direction
//!   planes (rayon); boundary closures run sequentially along the perimeter
//! - Every step ends with a sentinel scan of the perimeter, so an unclosed
//!   boundary population is reported as [`LatticeError::UnclosedBoundary`]
//!
//! ## Cavity runs
//!
//! [`CavityConfig`] derives the lattice parameters from the Reynolds number,
//! lid velocity and cavity size; [`CavitySimulation`] runs the time loop,
//! writes velocity images and centreline profiles and compares the result
//! with Ghia et al. (1982).

pub mod config;
pub mod error;
pub mod lattice;
pub mod output;
pub mod profiler;
pub mod simulation;
pub mod validation;

// Re-export main types
pub use config::{CavityConfig, LatticeParameters, RunParameters};
pub use error::{BoundarySegment, LatticeError, OutputError, RunError};
pub use lattice::boundary::WallVelocities;
pub use lattice::collision::Relaxation;
pub use lattice::fields::PopulationField;
pub use lattice::{Lattice, Vec2};
pub use output::{FieldWriter, OutputOptions};
pub use simulation::{CavitySimulation, RunSummary};
pub use validation::{CavityError, CenterlineProfiles, GhiaReference};

#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
