//! Enveloped XML-DSig signing with proper canonicalization

use base64::{engine::general_purpose::STANDARD, Engine};
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use xml_canonicalization::Canonicalizer;

use crate::error::{AssertionError, AssertionResult};
use crate::saml::algorithm::SignatureAlgorithm;

/// Inserts an enveloped signature into a SAML element.
///
/// Implementations must place the `ds:Signature` element as the immediate
/// next sibling of the element's `Issuer` child; relying parties reject
/// signatures found anywhere else.
pub trait Signer {
    /// Sign the element identified by `element_id`, returning the document
    /// with the signature embedded. On failure no partial document is
    /// returned.
    fn sign(
        &self,
        xml: &str,
        element_id: &str,
        algorithm: SignatureAlgorithm,
    ) -> AssertionResult<String>;
}

/// IdP signing key material: X.509 certificate plus RSA private key.
pub struct SigningCredentials {
    certificate: X509,
    private_key: PKey<Private>,
}

impl SigningCredentials {
    /// Load credentials from PEM-encoded certificate and private key.
    pub fn from_pem(certificate_pem: &str, private_key_pem: &str) -> AssertionResult<Self> {
        let certificate = X509::from_pem(certificate_pem.as_bytes())
            .map_err(|e| AssertionError::CertificateParseError(e.to_string()))?;
        let private_key = PKey::private_key_from_pem(private_key_pem.as_bytes())
            .map_err(|e| AssertionError::PrivateKeyError(e.to_string()))?;
        Ok(Self {
            certificate,
            private_key,
        })
    }

    /// Sign raw bytes with the private key using the algorithm's digest.
    pub fn sign_bytes(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
    ) -> AssertionResult<Vec<u8>> {
        let mut signer = openssl::sign::Signer::new(algorithm.message_digest(), &self.private_key)
            .map_err(|e| AssertionError::SigningFailed(format!("Signer creation failed: {e}")))?;
        signer
            .update(data)
            .map_err(|e| AssertionError::SigningFailed(format!("Signer update failed: {e}")))?;
        signer
            .sign_to_vec()
            .map_err(|e| AssertionError::SigningFailed(format!("Signing failed: {e}")))
    }

    /// Base64-encoded DER certificate for `ds:X509Certificate`.
    pub fn certificate_base64_der(&self) -> AssertionResult<String> {
        let der = self
            .certificate
            .to_der()
            .map_err(|e| AssertionError::CertificateParseError(e.to_string()))?;
        Ok(STANDARD.encode(der))
    }
}

/// Enveloped XML-DSig signer backed by openssl.
///
/// Signing procedure: exclusive C14N of the target element, digest,
/// `ds:SignedInfo` construction, C14N of the `SignedInfo`, RSA signature,
/// then the `ds:Signature` element is spliced in directly after
/// `</saml:Issuer>`. The signature XML carries no inter-element whitespace
/// so canonicalization of the signed document stays stable.
pub struct XmlDsigSigner {
    credentials: SigningCredentials,
}

impl XmlDsigSigner {
    /// Create a signer over the given credentials.
    #[must_use]
    pub fn new(credentials: SigningCredentials) -> Self {
        Self { credentials }
    }
}

impl Signer for XmlDsigSigner {
    fn sign(
        &self,
        xml: &str,
        element_id: &str,
        algorithm: SignatureAlgorithm,
    ) -> AssertionResult<String> {
        let issuer_end = xml.find("</saml:Issuer>").ok_or_else(|| {
            AssertionError::SigningFailed("Cannot find Issuer element".to_string())
        })?;
        let after_issuer = issuer_end + "</saml:Issuer>".len();

        // Digest covers the whole element as the relying party will see it
        // once the enveloped-signature transform has removed ds:Signature.
        let canonicalized = canonicalize_xml(xml)?;
        let digest = openssl::hash::hash(algorithm.message_digest(), canonicalized.as_bytes())
            .map_err(|e| AssertionError::SigningFailed(format!("Digest failed: {e}")))?;
        let digest_b64 = STANDARD.encode(digest);

        let mut signed_info = String::new();
        signed_info.push_str("<ds:SignedInfo xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\">");
        signed_info.push_str(
            "<ds:CanonicalizationMethod Algorithm=\"http://www.w3.org/2001/10/xml-exc-c14n#\"/>",
        );
        signed_info.push_str("<ds:SignatureMethod Algorithm=\"");
        signed_info.push_str(algorithm.signature_method_uri());
        signed_info.push_str("\"/>");
        signed_info.push_str("<ds:Reference URI=\"#");
        signed_info.push_str(element_id);
        signed_info.push_str("\">");
        signed_info.push_str("<ds:Transforms>");
        signed_info.push_str(
            "<ds:Transform Algorithm=\"http://www.w3.org/2000/09/xmldsig#enveloped-signature\"/>",
        );
        signed_info
            .push_str("<ds:Transform Algorithm=\"http://www.w3.org/2001/10/xml-exc-c14n#\"/>");
        signed_info.push_str("</ds:Transforms>");
        signed_info.push_str("<ds:DigestMethod Algorithm=\"");
        signed_info.push_str(algorithm.digest_method_uri());
        signed_info.push_str("\"/>");
        signed_info.push_str("<ds:DigestValue>");
        signed_info.push_str(&digest_b64);
        signed_info.push_str("</ds:DigestValue>");
        signed_info.push_str("</ds:Reference>");
        signed_info.push_str("</ds:SignedInfo>");

        // SignedInfo is canonicalized before signing, per XML-Sig
        let canonicalized_signed_info = canonicalize_xml(&signed_info)?;
        let signature = self
            .credentials
            .sign_bytes(algorithm, canonicalized_signed_info.as_bytes())?;
        let signature_b64 = STANDARD.encode(&signature);

        let certificate_base64 = self.credentials.certificate_base64_der()?;

        let mut sig_xml = String::new();
        sig_xml.push_str("<ds:Signature xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\">");
        sig_xml.push_str(&signed_info);
        sig_xml.push_str("<ds:SignatureValue>");
        sig_xml.push_str(&signature_b64);
        sig_xml.push_str("</ds:SignatureValue><ds:KeyInfo><ds:X509Data><ds:X509Certificate>");
        sig_xml.push_str(&certificate_base64);
        sig_xml.push_str("</ds:X509Certificate></ds:X509Data></ds:KeyInfo></ds:Signature>");

        let mut result = String::with_capacity(xml.len() + sig_xml.len());
        result.push_str(&xml[..after_issuer]);
        result.push_str(&sig_xml);
        result.push_str(&xml[after_issuer..]);

        Ok(result)
    }
}

/// Apply Exclusive XML Canonicalization (C14N) to XML content.
pub(crate) fn canonicalize_xml(xml: &str) -> AssertionResult<String> {
    let mut output = Vec::new();
    Canonicalizer::read_from_str(xml)
        .write_to_writer(&mut output)
        .canonicalize(false) // false = exclude comments (Exclusive C14N without comments)
        .map_err(|e| {
            AssertionError::SigningFailed(format!("XML canonicalization failed: {e}"))
        })?;

    String::from_utf8(output).map_err(|e| {
        AssertionError::SigningFailed(format!("Canonicalized XML is not valid UTF-8: {e}"))
    })
}
