//! SAML-specific utilities

pub mod algorithm;
pub mod name_id;
pub mod signing;

pub use algorithm::SignatureAlgorithm;
pub use name_id::{
    resolve_name_id, AttributeAccessor, AttributeGetter, ConfiguredPolicySource,
    NameIdFormatConfig, NameIdFormatPolicy, NameIdFormatPolicySource, Principal,
    NAMEID_FORMAT_EMAIL, NAMEID_FORMAT_PERSISTENT, NAMEID_FORMAT_TRANSIENT,
    NAMEID_FORMAT_UNSPECIFIED,
};
pub use signing::{Signer, SigningCredentials, XmlDsigSigner};
