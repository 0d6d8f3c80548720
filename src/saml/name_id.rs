//! NameID format policies and subject identifier resolution

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AssertionError, AssertionResult};

/// Supported `NameID` format URIs
pub const NAMEID_FORMAT_EMAIL: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress";
pub const NAMEID_FORMAT_PERSISTENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent";
pub const NAMEID_FORMAT_TRANSIENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:transient";
pub const NAMEID_FORMAT_UNSPECIFIED: &str =
    "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified";

/// The authenticated subject an assertion describes.
///
/// A read-only bag of named attributes. `None` means the principal does not
/// expose the attribute at all, distinct from an exposed-but-empty value.
pub trait Principal {
    /// Look up an attribute by name.
    fn attribute(&self, name: &str) -> Option<String>;
}

impl Principal for HashMap<String, String> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Caller-supplied extraction closure for a NameID value.
pub type AttributeGetter = Arc<dyn Fn(&dyn Principal) -> Option<String> + Send + Sync>;

/// How a policy extracts the NameID value from a principal.
#[derive(Clone)]
pub enum AttributeAccessor {
    /// Caller-supplied closure; takes priority over every other shape.
    Callable(AttributeGetter),
    /// Named attribute looked up on the principal.
    Named(String),
    /// Attribute name derived by lower-snake-casing the policy's friendly
    /// format name.
    Derived,
}

impl fmt::Debug for AttributeAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("Callable(..)"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Derived => f.write_str("Derived"),
        }
    }
}

/// The chosen rule for naming the subject in an assertion.
///
/// Exactly one policy is chosen per assertion; selection among multiple
/// configured formats lives behind [`NameIdFormatPolicySource`].
#[derive(Debug, Clone)]
pub struct NameIdFormatPolicy {
    /// The `NameID` format URI asserted.
    pub format_uri: String,
    /// Short name of the format, e.g. `"emailAddress"`. Used to derive the
    /// fallback attribute name when no accessor is configured.
    pub friendly_name: String,
    /// How the value is extracted from the principal.
    pub accessor: AttributeAccessor,
}

impl NameIdFormatPolicy {
    /// Email-address policy reading the principal's `email` attribute.
    #[must_use]
    pub fn email_address() -> Self {
        Self {
            format_uri: NAMEID_FORMAT_EMAIL.to_string(),
            friendly_name: "emailAddress".to_string(),
            accessor: AttributeAccessor::Named("email".to_string()),
        }
    }

    /// Persistent policy reading the principal's `user_id` attribute.
    #[must_use]
    pub fn persistent() -> Self {
        Self {
            format_uri: NAMEID_FORMAT_PERSISTENT.to_string(),
            friendly_name: "persistent".to_string(),
            accessor: AttributeAccessor::Named("user_id".to_string()),
        }
    }

    /// Transient policy generating a fresh opaque value per assertion.
    #[must_use]
    pub fn transient() -> Self {
        Self {
            format_uri: NAMEID_FORMAT_TRANSIENT.to_string(),
            friendly_name: "transient".to_string(),
            accessor: AttributeAccessor::Callable(Arc::new(|_: &dyn Principal| {
                Some(format!("_transient_{}", uuid::Uuid::new_v4()))
            })),
        }
    }
}

/// Resolve the subject identifier under the chosen policy.
///
/// Precedence: a callable accessor wins over a named accessor, which wins
/// over the friendly-name-derived fallback. Returns `None` when the policy
/// yields no usable value; an empty string from the principal is a present
/// (if questionable) value, not an absent one.
#[must_use]
pub fn resolve_name_id(principal: &dyn Principal, policy: &NameIdFormatPolicy) -> Option<String> {
    match &policy.accessor {
        AttributeAccessor::Callable(getter) => getter(principal),
        AttributeAccessor::Named(name) => principal.attribute(name),
        AttributeAccessor::Derived => principal.attribute(&snake_case(&policy.friendly_name)),
    }
}

/// Lower-snake-case a friendly format name (`"emailAddress"` → `"email_address"`).
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c == ' ' || c == '-' {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// Source of the one policy chosen for a relying party.
pub trait NameIdFormatPolicySource {
    /// Return exactly one policy, or fail when nothing is configured.
    fn chosen_policy(&self) -> AssertionResult<NameIdFormatPolicy>;
}

/// Policy source over an ordered list of configured formats.
///
/// The first configured format wins. Immutable after construction, so a
/// single instance is safe to share across concurrent builders.
#[derive(Debug, Clone)]
pub struct ConfiguredPolicySource {
    formats: Vec<NameIdFormatPolicy>,
}

impl ConfiguredPolicySource {
    /// Create a source over the configured formats, in preference order.
    #[must_use]
    pub fn new(formats: Vec<NameIdFormatPolicy>) -> Self {
        Self { formats }
    }
}

impl NameIdFormatPolicySource for ConfiguredPolicySource {
    fn chosen_policy(&self) -> AssertionResult<NameIdFormatPolicy> {
        self.formats.first().cloned().ok_or_else(|| {
            AssertionError::InvalidConfiguration("no NameID formats configured".to_string())
        })
    }
}

/// Declarative configuration shape for a NameID format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameIdFormatConfig {
    /// Friendly format name, e.g. `"emailAddress"`.
    pub format: String,
    /// Explicit format URI; inferred from `format` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_uri: Option<String>,
    /// Principal attribute holding the value; derived from `format` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl NameIdFormatConfig {
    /// Convert the configuration into a resolvable policy.
    #[must_use]
    pub fn into_policy(self) -> NameIdFormatPolicy {
        let format_uri = self
            .format_uri
            .unwrap_or_else(|| default_format_uri(&self.format).to_string());
        let accessor = match self.attribute {
            Some(name) => AttributeAccessor::Named(name),
            None => AttributeAccessor::Derived,
        };
        NameIdFormatPolicy {
            format_uri,
            friendly_name: self.format,
            accessor,
        }
    }
}

fn default_format_uri(friendly_name: &str) -> &'static str {
    match friendly_name {
        "emailAddress" => NAMEID_FORMAT_EMAIL,
        "persistent" => NAMEID_FORMAT_PERSISTENT,
        "transient" => NAMEID_FORMAT_TRANSIENT,
        _ => NAMEID_FORMAT_UNSPECIFIED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal_with(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_callable_accessor_takes_priority() {
        // The principal exposes `email`, but the callable must win.
        let principal = principal_with(&[("email", "attr@example.com")]);
        let policy = NameIdFormatPolicy {
            format_uri: NAMEID_FORMAT_EMAIL.to_string(),
            friendly_name: "emailAddress".to_string(),
            accessor: AttributeAccessor::Callable(Arc::new(|_: &dyn Principal| {
                Some("callable@example.com".to_string())
            })),
        };
        assert_eq!(
            resolve_name_id(&principal, &policy),
            Some("callable@example.com".to_string())
        );
    }

    #[test]
    fn test_named_accessor_reads_principal_attribute() {
        let principal = principal_with(&[("email", "a@b.com"), ("username", "alice")]);
        let policy = NameIdFormatPolicy {
            format_uri: NAMEID_FORMAT_UNSPECIFIED.to_string(),
            friendly_name: "unspecified".to_string(),
            accessor: AttributeAccessor::Named("username".to_string()),
        };
        assert_eq!(resolve_name_id(&principal, &policy), Some("alice".to_string()));
    }

    #[test]
    fn test_named_accessor_takes_priority_over_derived_fallback() {
        // Both attributes present; the named accessor must win over the
        // friendly-name derivation.
        let principal = principal_with(&[
            ("username", "alice"),
            ("email_address", "a@b.com"),
        ]);
        let policy = NameIdFormatPolicy {
            format_uri: NAMEID_FORMAT_EMAIL.to_string(),
            friendly_name: "emailAddress".to_string(),
            accessor: AttributeAccessor::Named("username".to_string()),
        };
        assert_eq!(resolve_name_id(&principal, &policy), Some("alice".to_string()));
    }

    #[test]
    fn test_derived_accessor_snake_cases_friendly_name() {
        let principal = principal_with(&[("email_address", "a@b.com")]);
        let policy = NameIdFormatPolicy {
            format_uri: NAMEID_FORMAT_EMAIL.to_string(),
            friendly_name: "emailAddress".to_string(),
            accessor: AttributeAccessor::Derived,
        };
        assert_eq!(resolve_name_id(&principal, &policy), Some("a@b.com".to_string()));
    }

    #[test]
    fn test_absent_attribute_is_distinct_from_empty_value() {
        let empty_value = principal_with(&[("email", "")]);
        let missing = principal_with(&[]);
        let policy = NameIdFormatPolicy::email_address();

        assert_eq!(resolve_name_id(&empty_value, &policy), Some(String::new()));
        assert_eq!(resolve_name_id(&missing, &policy), None);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let principal = principal_with(&[("email", "a@b.com")]);
        let policy = NameIdFormatPolicy::email_address();
        let first = resolve_name_id(&principal, &policy);
        let second = resolve_name_id(&principal, &policy);
        assert_eq!(first, second);
    }

    #[test]
    fn test_snake_case_forms() {
        assert_eq!(snake_case("emailAddress"), "email_address");
        assert_eq!(snake_case("Email Address"), "email_address");
        assert_eq!(snake_case("persistent"), "persistent");
        assert_eq!(snake_case("X509SubjectName"), "x509_subject_name");
        assert_eq!(snake_case("kerberos-principal"), "kerberos_principal");
    }

    #[test]
    fn test_transient_policy_generates_opaque_values() {
        let principal = principal_with(&[]);
        let policy = NameIdFormatPolicy::transient();
        let value = resolve_name_id(&principal, &policy).unwrap();
        assert!(value.starts_with("_transient_"));
    }

    #[test]
    fn test_configured_source_chooses_first_format() {
        let source = ConfiguredPolicySource::new(vec![
            NameIdFormatPolicy::email_address(),
            NameIdFormatPolicy::persistent(),
        ]);
        let chosen = source.chosen_policy().unwrap();
        assert_eq!(chosen.format_uri, NAMEID_FORMAT_EMAIL);
    }

    #[test]
    fn test_empty_configured_source_errors() {
        let source = ConfiguredPolicySource::new(Vec::new());
        assert!(source.chosen_policy().is_err());
    }

    #[test]
    fn test_config_without_attribute_derives_accessor() {
        let config = NameIdFormatConfig {
            format: "emailAddress".to_string(),
            format_uri: None,
            attribute: None,
        };
        let policy = config.into_policy();
        assert_eq!(policy.format_uri, NAMEID_FORMAT_EMAIL);
        assert!(matches!(policy.accessor, AttributeAccessor::Derived));

        let principal = principal_with(&[("email_address", "a@b.com")]);
        assert_eq!(resolve_name_id(&principal, &policy), Some("a@b.com".to_string()));
    }

    #[test]
    fn test_config_deserializes_from_json() {
        let config: NameIdFormatConfig = serde_json::from_str(
            r#"{"format": "emailAddress", "attribute": "mail"}"#,
        )
        .unwrap();
        let policy = config.into_policy();
        assert_eq!(policy.format_uri, NAMEID_FORMAT_EMAIL);

        let principal = principal_with(&[("mail", "a@b.com")]);
        assert_eq!(resolve_name_id(&principal, &policy), Some("a@b.com".to_string()));
    }

    #[test]
    fn test_config_with_attribute_uses_named_accessor() {
        let config = NameIdFormatConfig {
            format: "persistent".to_string(),
            format_uri: None,
            attribute: Some("subject_id".to_string()),
        };
        let policy = config.into_policy();
        let principal = principal_with(&[("subject_id", "u-42")]);
        assert_eq!(resolve_name_id(&principal, &policy), Some("u-42".to_string()));
    }
}
