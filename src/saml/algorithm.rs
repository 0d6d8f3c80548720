//! Signature and digest algorithm selection

use openssl::hash::MessageDigest;
use serde::{Deserialize, Serialize};

/// Digest/signature algorithm pair used when signing an assertion.
///
/// Selected per relying party from configuration; unrecognized raw names
/// fall back to SHA-256.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    /// RSA-SHA1 (legacy relying parties only)
    Sha1,
    /// RSA-SHA256
    #[default]
    Sha256,
    /// RSA-SHA384
    Sha384,
    /// RSA-SHA512
    Sha512,
}

impl SignatureAlgorithm {
    /// Select an algorithm from a raw configured name.
    ///
    /// Accepts short names (`"sha256"`), hyphenated names (`"rsa-sha512"`),
    /// and full XML-DSig URIs. Unknown names select SHA-256.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let raw = raw.to_ascii_lowercase();
        if raw.contains("512") {
            Self::Sha512
        } else if raw.contains("384") {
            Self::Sha384
        } else if raw.contains("sha1") {
            Self::Sha1
        } else {
            Self::Sha256
        }
    }

    /// XML-DSig `SignatureMethod` URI for this algorithm.
    #[must_use]
    pub fn signature_method_uri(&self) -> &'static str {
        match self {
            Self::Sha1 => "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
            Self::Sha256 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
            Self::Sha384 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384",
            Self::Sha512 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512",
        }
    }

    /// XML-DSig `DigestMethod` URI for this algorithm.
    #[must_use]
    pub fn digest_method_uri(&self) -> &'static str {
        match self {
            Self::Sha1 => "http://www.w3.org/2000/09/xmldsig#sha1",
            Self::Sha256 => "http://www.w3.org/2001/04/xmlenc#sha256",
            Self::Sha384 => "http://www.w3.org/2001/04/xmldsig-more#sha384",
            Self::Sha512 => "http://www.w3.org/2001/04/xmlenc#sha512",
        }
    }

    /// The openssl digest handle backing this algorithm.
    #[must_use]
    pub fn message_digest(&self) -> MessageDigest {
        match self {
            Self::Sha1 => MessageDigest::sha1(),
            Self::Sha256 => MessageDigest::sha256(),
            Self::Sha384 => MessageDigest::sha384(),
            Self::Sha512 => MessageDigest::sha512(),
        }
    }
}
