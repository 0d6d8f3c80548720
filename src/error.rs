//! Assertion-specific error types

use thiserror::Error;

/// Result type for assertion operations
pub type AssertionResult<T> = Result<T, AssertionError>;

/// Errors surfaced while constructing a signed assertion
#[derive(Debug, Error)]
pub enum AssertionError {
    /// Malformed construction parameters, rejected before any XML is produced
    #[error("Invalid assertion configuration: {0}")]
    InvalidConfiguration(String),

    /// The chosen NameID policy yielded no usable value for the principal
    #[error("No NameID value resolved for format: {format}")]
    NameIdResolutionFailed {
        /// The NameID format URI whose policy failed to resolve
        format: String,
    },

    /// The delegated signer could not produce a signature
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Certificate parsing error
    #[error("Certificate parsing error: {0}")]
    CertificateParseError(String),

    /// Private key error
    #[error("Private key error: {0}")]
    PrivateKeyError(String),
}
