//! Error types for ezformant.
//!
//! Every stage of the formant pipeline returns a typed outcome instead of
//! panicking. The variants split into two groups:
//!
//! - **Caller bugs**: `InvalidParameter`. The configuration is out of range
//!   and retrying with the same values will fail again.
//! - **Frame-level conditions**: `DegenerateInput`, `UnstableFilter` and
//!   `ConvergenceFailure`. The current buffer could not be analyzed; the
//!   caller should skip the frame (keep stale values or blank the display).

use thiserror::Error;

/// Result type alias using ezformant's Error type.
///
/// # Example
///
/// ```
/// use ezformant::{estimate_lpc, Result};
///
/// fn voiced(buffer: &[f64]) -> Result<bool> {
///     let lpc = estimate_lpc(buffer, 14)?;
///     Ok(!lpc.is_degenerate())
/// }
/// # assert!(!voiced(&[0.0; 64]).unwrap());
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during formant analysis.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid parameter value.
    ///
    /// Returned at the boundary when an order, downsample factor, number of
    /// response points, sample rate or limit is out of its valid range.
    /// Values are never silently coerced.
    ///
    /// # Examples of invalid parameters
    ///
    /// - LPC order of 0, or not smaller than the buffer length
    /// - Downsample factor of 0, or not smaller than the buffer length
    /// - Zero response points
    /// - Non-positive or non-finite sample rate
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Silence or near-zero energy input.
    ///
    /// Signals "no voiced signal" for this buffer. Not fatal.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// The Levinson-Durbin recursion produced a reflection coefficient with
    /// magnitude >= 1, i.e. the all-pole filter would be unstable.
    ///
    /// `step` is the 1-based recursion step at which it happened.
    #[error("Unstable filter: reflection coefficient {reflection} at step {step}")]
    UnstableFilter {
        /// Recursion step (1-based).
        step: usize,
        /// Offending reflection coefficient.
        reflection: f64,
    },

    /// A bounded iterative step (polynomial root finding) hit its
    /// iteration cap before converging.
    #[error("Root finding did not converge within {iterations} iterations")]
    ConvergenceFailure {
        /// Iteration cap that was exceeded.
        iterations: usize,
    },
}

impl Error {
    /// Whether the error only affects the current frame.
    ///
    /// Recoverable errors mean "skip this buffer and try the next one".
    /// `InvalidParameter` is not recoverable: the same call will keep failing.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::InvalidParameter(_))
    }

    /// Whether this is a `DegenerateInput` (silence) error.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Error::DegenerateInput(_))
    }
}
