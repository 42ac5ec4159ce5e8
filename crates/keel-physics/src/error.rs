//! Error type for the public construction/configuration API.
//!
//! Nothing inside the tick itself returns errors: a bad contact must not
//! stall the simulation, so in-tick failures degrade locally (skip + warn).

use thiserror::Error;

/// Errors raised when building bodies, shapes, or registering them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// A simulated body needs a positive, finite mass.
    #[error("mass must be positive and finite for a simulated body, got {0}")]
    InvalidMass(f32),

    /// Shape dimensions must be positive and finite.
    #[error("invalid {shape} dimensions: {reason}")]
    InvalidShape {
        /// Shape variant name.
        shape: &'static str,
        /// What was wrong with it.
        reason: &'static str,
    },
}
