//! D2Q9 lattice engine
//!
//! `Lattice` owns the populations, the macroscopic fields and the wall
//! velocities of a rectangular node grid, and advances them one timestep at a
//! time. The per-iteration stage order is fixed inside [`Lattice::advance`]:
//!
//! 1. equilibrium from the current `rho`, `u`
//! 2. TRT collision
//! 3. streaming (double-buffered)
//! 4. Zou-He closure: bottom, left, right, top walls
//! 5. Zou-He closure: bottom-left, top-left, top-right, bottom-right corners
//! 6. closure verification (no unset sentinel left on the perimeter)
//!
//! Macroscopic recovery is a separate call, made by the driver at the start of
//! each reporting step.

pub mod boundary;
pub mod collision;
pub mod equilibrium;
pub mod fields;
pub mod geometry;
pub mod macroscopic;
pub mod streaming;

use crate::config::{LatticeParameters, MAX_RECOMMENDED_LID_VELOCITY};
use crate::error::LatticeError;
use crate::profiler::{Stage, StageTimer};
use boundary::{apply_zou_he, verify_closure, NodeFields, WallVelocities};
use collision::{collide_trt, Relaxation};
use equilibrium::compute_equilibrium;
use fields::PopulationField;
use nalgebra::Vector2;
use streaming::stream;
use tracing::{debug, info, warn};

/// 2D velocity vector in lattice units
pub type Vec2 = Vector2<f64>;

/// State of a D2Q9 lattice
#[derive(Debug, Clone)]
pub struct Lattice {
    params: LatticeParameters,
    relaxation: Relaxation,

    // Current populations and their equilibrium
    g: PopulationField,
    g_eq: PopulationField,
    // Write target of collision and streaming, swapped with `g` afterwards
    g_back: PopulationField,

    rho: Vec<f64>,
    u: Vec<Vec2>,
    walls: WallVelocities,

    width: usize,
    height: usize,
    iteration: u64,
    timer: StageTimer,
}

impl Lattice {
    /// Create a lattice at rest (`rho = 1`, `u = 0`, populations at equilibrium)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the parameters fail validation, in
    /// particular when `tau_lbm <= 0.5`
    pub fn new(params: LatticeParameters) -> Result<Self, LatticeError> {
        params.validate()?;
        let relaxation = Relaxation::from_tau(params.tau_lbm)?;
        if !params.is_low_mach() {
            warn!(
                "Lid velocity {} exceeds {} lattice units; compressibility errors will grow",
                params.u_lbm, MAX_RECOMMENDED_LID_VELOCITY
            );
        }

        let width = params.nx + 1;
        let height = params.ny + 1;
        let nodes = width * height;

        let mut lattice = Self {
            params,
            relaxation,
            g: PopulationField::new(width, height),
            g_eq: PopulationField::new(width, height),
            g_back: PopulationField::new(width, height),
            rho: vec![1.0; nodes],
            u: vec![Vec2::zeros(); nodes],
            walls: WallVelocities::no_slip(width, height),
            width,
            height,
            iteration: 0,
            timer: StageTimer::new(),
        };
        lattice.equilibrium();
        lattice.g.copy_from(&lattice.g_eq);

        info!(
            "Lattice initialized: {}x{} nodes, tau+={:.4}, tau-={:.4}, nu={:.5}",
            width, height, relaxation.tau_plus, relaxation.tau_minus, params.nu_lbm
        );

        Ok(lattice)
    }

    /// Set up the lid-driven cavity initial condition
    ///
    /// Moving lid on the top wall, no-slip elsewhere; wall velocities are
    /// copied onto the boundary nodes, density is reset to `rho_lbm` everywhere
    /// and the populations are reset to the resulting equilibrium. Calling it
    /// again replaces the previous initial condition.
    pub fn set_cavity(&mut self, lid_velocity: f64) {
        self.set_walls(WallVelocities::cavity(
            self.width,
            self.height,
            lid_velocity,
            0.0,
            0.0,
            0.0,
        ));
        self.rho.fill(self.params.rho_lbm);
        self.equilibrium();
        self.g.copy_from(&self.g_eq);
        debug!("Cavity initial condition set, lid velocity {}", lid_velocity);
    }

    /// Replace the prescribed wall velocities and impose them on the boundary nodes
    ///
    /// # Panics
    ///
    /// Panics if a wall profile does not match the grid size
    pub fn set_walls(&mut self, walls: WallVelocities) {
        assert_eq!(walls.bottom.len(), self.width, "bottom wall profile length");
        assert_eq!(walls.top.len(), self.width, "top wall profile length");
        assert_eq!(walls.left.len(), self.height, "left wall profile length");
        assert_eq!(walls.right.len(), self.height, "right wall profile length");

        let (lx, ly) = (self.width - 1, self.height - 1);
        for i in 0..self.width {
            let (bottom, top) = (self.idx(i, 0), self.idx(i, ly));
            self.u[bottom] = walls.bottom[i];
            self.u[top] = walls.top[i];
        }
        for j in 1..ly {
            let (left, right) = (self.idx(0, j), self.idx(lx, j));
            self.u[left] = walls.left[j];
            self.u[right] = walls.right[j];
        }
        self.walls = walls;
    }

    /// Overwrite density and velocity and reset the populations to equilibrium
    ///
    /// Used to start from a non-trivial state (e.g. a density perturbation).
    ///
    /// # Panics
    ///
    /// Panics if a field does not have one value per node
    pub fn set_macroscopic(&mut self, rho: &[f64], u: &[Vec2]) {
        assert_eq!(rho.len(), self.rho.len(), "density field length");
        assert_eq!(u.len(), self.u.len(), "velocity field length");
        self.rho.copy_from_slice(rho);
        self.u.copy_from_slice(u);
        self.equilibrium();
        self.g.copy_from(&self.g_eq);
    }

    /// Advance one timestep
    ///
    /// Runs equilibrium, collision, streaming, the eight Zou-He closures and
    /// the closure check, in that order.
    ///
    /// # Errors
    ///
    /// Returns `UnclosedBoundary` if a perimeter population was left unset
    pub fn advance(&mut self) -> Result<(), LatticeError> {
        self.equilibrium();
        self.collide();
        self.stream();
        self.close_boundaries();

        {
            let _scope = self.timer.scope(Stage::Verify);
            verify_closure(&self.g, self.iteration)?;
        }

        self.iteration += 1;
        Ok(())
    }

    /// Recompute `rho` and `u` from the populations
    ///
    /// # Errors
    ///
    /// Returns `Diverged` if any node has a non-positive or non-finite density
    pub fn recover_macroscopic(&mut self) -> Result<(), LatticeError> {
        let _scope = self.timer.scope(Stage::Macroscopic);
        macroscopic::recover_macroscopic(&self.g, &mut self.rho, &mut self.u, self.iteration)
    }

    fn equilibrium(&mut self) {
        let _scope = self.timer.scope(Stage::Equilibrium);
        compute_equilibrium(&self.rho, &self.u, &mut self.g_eq);
    }

    fn collide(&mut self) {
        let _scope = self.timer.scope(Stage::Collision);
        collide_trt(&self.g, &self.g_eq, &self.relaxation, &mut self.g_back);
        std::mem::swap(&mut self.g, &mut self.g_back);
    }

    fn stream(&mut self) {
        let _scope = self.timer.scope(Stage::Streaming);
        stream(&self.g, &mut self.g_back);
        std::mem::swap(&mut self.g, &mut self.g_back);
    }

    fn close_boundaries(&mut self) {
        let _scope = self.timer.scope(Stage::Boundary);
        let mut fields = NodeFields {
            rho: &mut self.rho,
            u: &mut self.u,
            height: self.height,
        };
        apply_zou_he(&mut self.g, &mut fields, &self.walls);
    }

    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        i * self.height + j
    }

    /// Engine parameters
    pub fn params(&self) -> &LatticeParameters {
        &self.params
    }

    /// TRT relaxation rates
    pub fn relaxation(&self) -> &Relaxation {
        &self.relaxation
    }

    /// Node count along x (`nx + 1`)
    pub fn width(&self) -> usize {
        self.width
    }

    /// Node count along y (`ny + 1`)
    pub fn height(&self) -> usize {
        self.height
    }

    /// Last node index along x
    pub fn lx(&self) -> usize {
        self.width - 1
    }

    /// Last node index along y
    pub fn ly(&self) -> usize {
        self.height - 1
    }

    /// Completed timesteps
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Current populations
    pub fn populations(&self) -> &PopulationField {
        &self.g
    }

    /// Equilibrium populations of the last equilibrium stage
    pub fn equilibrium_populations(&self) -> &PopulationField {
        &self.g_eq
    }

    /// Density per node, x-major
    pub fn density(&self) -> &[f64] {
        &self.rho
    }

    /// Velocity per node, x-major
    pub fn velocity(&self) -> &[Vec2] {
        &self.u
    }

    /// Density at node `(i, j)`
    pub fn density_at(&self, i: usize, j: usize) -> f64 {
        self.rho[self.idx(i, j)]
    }

    /// Velocity at node `(i, j)`
    pub fn velocity_at(&self, i: usize, j: usize) -> Vec2 {
        self.u[self.idx(i, j)]
    }

    /// Prescribed wall velocities
    pub fn walls(&self) -> &WallVelocities {
        &self.walls
    }

    /// Sum of the density over every node
    pub fn total_mass(&self) -> f64 {
        macroscopic::total_mass(&self.rho)
    }

    /// Accumulated wall time per stage
    pub fn timings(&self) -> &StageTimer {
        &self.timer
    }
}
