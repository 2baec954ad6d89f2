//! Error types for the lattice engine and its output collaborators
//!
//! Every failure the engine can detect is fatal for the run: configuration
//! problems are reported before the first step, closure defects and numerical
//! divergence are reported with the iteration and node where they were found.

use std::fmt;

/// Wall segment of the cavity perimeter
///
/// Edges exclude their end nodes; the four corners are segments of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundarySegment {
    /// `j = 0`
    Bottom,
    /// `j = ly`
    Top,
    /// `i = 0`
    Left,
    /// `i = lx`
    Right,
    /// `(0, 0)`
    BottomLeft,
    /// `(0, ly)`
    TopLeft,
    /// `(lx, ly)`
    TopRight,
    /// `(lx, 0)`
    BottomRight,
}

impl fmt::Display for BoundarySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bottom => "bottom wall",
            Self::Top => "top wall",
            Self::Left => "left wall",
            Self::Right => "right wall",
            Self::BottomLeft => "bottom-left corner",
            Self::TopLeft => "top-left corner",
            Self::TopRight => "top-right corner",
            Self::BottomRight => "bottom-right corner",
        };
        f.write_str(name)
    }
}

/// Errors raised by the lattice engine
#[derive(Debug, Clone, PartialEq)]
pub enum LatticeError {
    /// A run parameter is out of its admissible range
    InvalidConfig {
        /// Name of the offending parameter (e.g. `"tau_lbm"`, `"nx"`)
        parameter: &'static str,
        /// What is wrong with it
        reason: String,
    },
    /// A perimeter population still holds the unset sentinel after closure
    UnclosedBoundary {
        /// Lattice direction of the unclosed population
        direction: usize,
        /// Wall segment that was scanned
        segment: BoundarySegment,
        /// First offending node `(i, j)`
        first: (usize, usize),
        /// Last offending node `(i, j)`
        last: (usize, usize),
        /// Iteration during which the defect was detected
        iteration: u64,
    },
    /// Density became non-positive or non-finite
    Diverged {
        /// Node x index
        i: usize,
        /// Node y index
        j: usize,
        /// Offending density value
        rho: f64,
        /// Iteration at which recovery failed
        iteration: u64,
    },
    /// No published centreline data for this Reynolds number
    NoReference {
        /// Reynolds number of the run
        reynolds: f64,
    },
}

impl LatticeError {
    /// Create a configuration error for `parameter`.
    pub fn invalid_config(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            parameter,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for LatticeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatticeError::InvalidConfig { parameter, reason } => {
                write!(f, "Invalid configuration: {parameter} {reason}")
            }
            LatticeError::UnclosedBoundary {
                direction,
                segment,
                first,
                last,
                iteration,
            } => write!(
                f,
                "Unclosed boundary population at iteration {iteration}: direction {direction} on the {segment}, nodes {first:?}..={last:?} still hold the unset sentinel"
            ),
            LatticeError::Diverged {
                i,
                j,
                rho,
                iteration,
            } => write!(
                f,
                "Simulation diverged at iteration {iteration}: density {rho} at node ({i}, {j})"
            ),
            LatticeError::NoReference { reynolds } => {
                write!(f, "No reference centreline data for Re = {reynolds}")
            }
        }
    }
}

impl std::error::Error for LatticeError {}

/// Errors that can occur while writing field output
#[derive(Debug)]
pub enum OutputError {
    /// Failed to create a directory or write a file
    Io(std::io::Error),
    /// Failed to encode an image
    Image(image::ImageError),
    /// Failed to serialize or parse a configuration file
    Json(serde_json::Error),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::Io(err) => write!(f, "Output I/O failed: {err}"),
            OutputError::Image(err) => write!(f, "Failed to encode image: {err}"),
            OutputError::Json(err) => write!(f, "Failed to (de)serialize JSON: {err}"),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Io(err) => Some(err),
            OutputError::Image(err) => Some(err),
            OutputError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for OutputError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for OutputError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}

impl From<serde_json::Error> for OutputError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Any failure of a full cavity run
#[derive(Debug)]
pub enum RunError {
    /// Engine failure (configuration, closure defect, divergence)
    Lattice(LatticeError),
    /// Output collaborator failure
    Output(OutputError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Lattice(err) => write!(f, "{err}"),
            RunError::Output(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Lattice(err) => Some(err),
            RunError::Output(err) => Some(err),
        }
    }
}

impl From<LatticeError> for RunError {
    fn from(err: LatticeError) -> Self {
        Self::Lattice(err)
    }
}

impl From<OutputError> for RunError {
    fn from(err: OutputError) -> Self {
        Self::Output(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unclosed_boundary_message_names_direction_and_segment() {
        let err = LatticeError::UnclosedBoundary {
            direction: 5,
            segment: BoundarySegment::Left,
            first: (0, 1),
            last: (0, 7),
            iteration: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("direction 5"));
        assert!(msg.contains("left wall"));
        assert!(msg.contains("iteration 12"));
    }

    #[test]
    fn test_invalid_config_message() {
        let err = LatticeError::invalid_config("tau_lbm", "must exceed 0.5, got 0.5");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: tau_lbm must exceed 0.5, got 0.5"
        );
    }

    #[test]
    fn test_run_error_wraps_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = RunError::from(OutputError::from(io));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("missing"));
    }
}
