//! Signed SAML assertion builder for single-logout exchanges
//!
//! This crate builds the time-bounded, signed assertion fragment an
//! identity provider embeds in a single-logout exchange:
//! - Validity window derivation from a single capture of "now"
//! - Pluggable subject identifier (`NameID`) resolution per relying party
//! - Enveloped XML-DSig signing behind a [`Signer`] trait, with a concrete
//!   openssl-backed implementation
//!
//! One [`LogoutAssertionBuilder`] is constructed per assertion, used once,
//! and discarded. The surrounding protocol layer (request parsing, HTTP
//! bindings, metadata) is out of scope.

pub mod error;
pub mod saml;
pub mod services;

pub use error::{AssertionError, AssertionResult};
pub use saml::{
    NameIdFormatPolicy, NameIdFormatPolicySource, Principal, SignatureAlgorithm, Signer,
    SigningCredentials, XmlDsigSigner,
};
pub use services::{AssertionRequest, LogoutAssertionBuilder, ValidityWindow};
