//! Signed assertion builder for single-logout exchanges

use chrono::Duration;
use tracing::{debug, error};

use crate::error::{AssertionError, AssertionResult};
use crate::saml::algorithm::SignatureAlgorithm;
use crate::saml::name_id::{resolve_name_id, NameIdFormatPolicy, Principal};
use crate::saml::signing::Signer;
use crate::services::validity::ValidityWindow;

/// SAML 2.0 assertion namespace
pub const ASSERTION_NAMESPACE: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// Default statement lifetime when the caller does not set one.
pub const DEFAULT_EXPIRY_SECONDS: i64 = 3600;

/// Construction parameters for one assertion.
///
/// Immutable for the builder's lifetime; validated eagerly when the builder
/// is constructed.
#[derive(Debug, Clone)]
pub struct AssertionRequest {
    /// Unique token forming the XML `ID` and `SessionIndex` (underscore-prefixed).
    pub reference_id: String,
    /// Entity ID of the issuing party.
    pub issuer_uri: String,
    /// Entity ID of the intended relying party.
    pub audience_uri: String,
    /// ID of the request this assertion answers.
    pub saml_request_id: String,
    /// Assertion Consumer Service URL the enclosing response targets.
    pub saml_acs_url: String,
    /// Digest/signature algorithm handed to the signer.
    pub signature_algorithm: SignatureAlgorithm,
    /// Authentication method asserted in the `AuthnContextClassRef`.
    pub authn_context_classref: String,
    /// Lifetime of the statement's validity window.
    pub expiry: Duration,
}

impl AssertionRequest {
    /// Create a request with the default one-hour expiry.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        reference_id: impl Into<String>,
        issuer_uri: impl Into<String>,
        audience_uri: impl Into<String>,
        saml_request_id: impl Into<String>,
        saml_acs_url: impl Into<String>,
        signature_algorithm: SignatureAlgorithm,
        authn_context_classref: impl Into<String>,
    ) -> Self {
        Self {
            reference_id: reference_id.into(),
            issuer_uri: issuer_uri.into(),
            audience_uri: audience_uri.into(),
            saml_request_id: saml_request_id.into(),
            saml_acs_url: saml_acs_url.into(),
            signature_algorithm,
            authn_context_classref: authn_context_classref.into(),
            expiry: Duration::seconds(DEFAULT_EXPIRY_SECONDS),
        }
    }

    /// Override the statement expiry.
    #[must_use]
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    fn validate(&self) -> AssertionResult<()> {
        if self.reference_id.is_empty() {
            return Err(AssertionError::InvalidConfiguration(
                "reference_id must not be empty".to_string(),
            ));
        }
        if self.issuer_uri.is_empty() {
            return Err(AssertionError::InvalidConfiguration(
                "issuer_uri must not be empty".to_string(),
            ));
        }
        if self.audience_uri.is_empty() {
            return Err(AssertionError::InvalidConfiguration(
                "audience_uri must not be empty".to_string(),
            ));
        }
        if self.saml_acs_url.is_empty() {
            return Err(AssertionError::InvalidConfiguration(
                "saml_acs_url must not be empty".to_string(),
            ));
        }
        if self.authn_context_classref.is_empty() {
            return Err(AssertionError::InvalidConfiguration(
                "authn_context_classref must not be empty".to_string(),
            ));
        }
        if self.expiry <= Duration::zero() {
            return Err(AssertionError::InvalidConfiguration(
                "expiry must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for one signed assertion.
///
/// Strictly single-use: the validity window is captured at construction,
/// so a builder must not be reused across requests. Concurrency is
/// independent builder instances; nothing is shared.
pub struct LogoutAssertionBuilder<'p> {
    request: AssertionRequest,
    principal: &'p dyn Principal,
    policy: NameIdFormatPolicy,
    window: ValidityWindow,
}

impl<'p> LogoutAssertionBuilder<'p> {
    /// Validate the request and capture the validity window.
    pub fn new(
        request: AssertionRequest,
        principal: &'p dyn Principal,
        policy: NameIdFormatPolicy,
    ) -> AssertionResult<Self> {
        request.validate()?;
        let window = ValidityWindow::capture(request.expiry);
        Ok(Self {
            request,
            principal,
            policy,
            window,
        })
    }

    /// The validity window captured for this assertion.
    #[must_use]
    pub fn window(&self) -> &ValidityWindow {
        &self.window
    }

    /// The subject identifier under the chosen policy.
    ///
    /// Resolution failure is a hard error: an assertion with an absent
    /// subject is ambiguous to the relying party.
    pub fn name_id(&self) -> AssertionResult<String> {
        resolve_name_id(self.principal, &self.policy).ok_or_else(|| {
            AssertionError::NameIdResolutionFailed {
                format: self.policy.format_uri.clone(),
            }
        })
    }

    /// Build the signed assertion XML.
    ///
    /// The signer inserts the `ds:Signature` element as the Issuer's next
    /// sibling; its failures propagate verbatim and no partial XML is
    /// returned.
    pub fn build(&self, signer: &dyn Signer) -> AssertionResult<String> {
        self.name_id()?;

        let reference = self.reference_string();
        let mut xml = String::new();
        xml.push_str("<saml:Assertion xmlns:saml=\"");
        xml.push_str(ASSERTION_NAMESPACE);
        xml.push_str("\" ID=\"");
        xml.push_str(&xml_escape(&reference));
        xml.push_str("\" IssueInstant=\"");
        xml.push_str(self.window.issue_instant());
        xml.push_str("\" Version=\"2.0\">");
        xml.push_str("<saml:Issuer>");
        xml.push_str(&xml_escape(&self.request.issuer_uri));
        xml.push_str("</saml:Issuer>");
        xml.push_str("<saml:AuthnStatement AuthnInstant=\"");
        xml.push_str(self.window.authn_instant());
        xml.push_str("\" SessionIndex=\"");
        xml.push_str(&xml_escape(&reference));
        xml.push_str("\">");
        xml.push_str("<saml:AuthnContext><saml:AuthnContextClassRef>");
        xml.push_str(&xml_escape(&self.request.authn_context_classref));
        xml.push_str("</saml:AuthnContextClassRef></saml:AuthnContext>");
        xml.push_str("</saml:AuthnStatement></saml:Assertion>");

        let signed = signer
            .sign(&xml, &reference, self.request.signature_algorithm)
            .map_err(|e| {
                error!(assertion_id = %reference, "assertion signing failed");
                e
            })?;

        debug!(
            assertion_id = %reference,
            in_response_to = %self.request.saml_request_id,
            "built signed logout assertion"
        );
        Ok(signed)
    }

    /// XML ID values must not begin with a digit; the reference token is
    /// underscore-prefixed for both `ID` and `SessionIndex`.
    fn reference_string(&self) -> String {
        format!("_{}", self.request.reference_id)
    }
}

/// XML escape special characters
fn xml_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}
