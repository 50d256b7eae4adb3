//! Error types for the anti-collision kernel.

use thiserror::Error;

/// Kernel error type.
///
/// The kernel recovers nothing internally: every failure is surfaced to the
/// caller, which owns logging, retry, and schedule re-planning. A colliding
/// move is *not* an error; it is reported through the collision fields of a
/// [`crate::schedule::Sweep`].
#[derive(Error, Debug)]
pub enum KavachError {
    /// Parallel coordinate arrays of unequal length.
    #[error("coordinate arrays differ in length: {x_len} vs {y_len}")]
    ShapeMismatch { x_len: usize, y_len: usize },

    /// A caller-supplied value is out of the accepted domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A positioner's calibration cannot be used for collision checking.
    ///
    /// Raised for non-finite calibration values and for the fatal geometric
    /// condition of more than 6 neighbors.
    #[error("calibration invalid for {posid}: {reason}")]
    CalibrationInvalid { posid: String, reason: String },

    /// A derived polygon contains a non-finite coordinate.
    #[error("non-finite coordinate produced while {context}")]
    NumericDegenerate { context: String },

    /// A posid that was never registered.
    #[error("unknown positioner: {0}")]
    UnknownPositioner(String),
}

pub type Result<T> = std::result::Result<T, KavachError>;
