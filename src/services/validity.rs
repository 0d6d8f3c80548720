//! Assertion validity window calculation
//!
//! All timestamps in an assertion derive from a single capture of "now",
//! so the issue instant, the authentication instant, and the validity
//! bounds can never skew against each other within one assertion.

use chrono::{DateTime, Duration, Utc};

/// Clock-skew allowance subtracted from the capture instant for `NotBefore`.
const CLOCK_SKEW_SECONDS: i64 = 5;

/// Lifetime of the subject confirmation, independent of the statement expiry.
const SUBJECT_CONFIRMATION_SECONDS: i64 = 180;

/// Timestamp format emitted in assertions: UTC, extended ISO-8601.
const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The validity window of a single assertion.
///
/// Captured once per assertion; every derived timestamp is formatted
/// eagerly at construction into immutable fields, so repeated reads
/// always return identical values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityWindow {
    issue_instant: String,
    not_before: String,
    not_on_or_after_statement: String,
    not_on_or_after_subject_confirmation: String,
}

impl ValidityWindow {
    /// Capture the current UTC time and derive the window from it.
    #[must_use]
    pub fn capture(expiry: Duration) -> Self {
        Self::at(Utc::now(), expiry)
    }

    /// Derive the window from a fixed instant.
    ///
    /// The three bounds are each computed from `now` directly, never from
    /// one another. A zero or negative `expiry` is accepted and simply
    /// yields an already-expired statement window.
    #[must_use]
    pub fn at(now: DateTime<Utc>, expiry: Duration) -> Self {
        Self {
            issue_instant: format_instant(now),
            not_before: format_instant(now - Duration::seconds(CLOCK_SKEW_SECONDS)),
            not_on_or_after_statement: format_instant(now + expiry),
            not_on_or_after_subject_confirmation: format_instant(
                now + Duration::seconds(SUBJECT_CONFIRMATION_SECONDS),
            ),
        }
    }

    /// The instant the assertion was issued.
    #[must_use]
    pub fn issue_instant(&self) -> &str {
        &self.issue_instant
    }

    /// The instant the authentication event is asserted to have happened.
    ///
    /// Same captured instant as [`issue_instant`](Self::issue_instant),
    /// reused in a second XML location.
    #[must_use]
    pub fn authn_instant(&self) -> &str {
        &self.issue_instant
    }

    /// Lower validity bound, with clock-skew allowance.
    #[must_use]
    pub fn not_before(&self) -> &str {
        &self.not_before
    }

    /// Upper validity bound of the authentication statement.
    #[must_use]
    pub fn not_on_or_after_statement(&self) -> &str {
        &self.not_on_or_after_statement
    }

    /// Upper validity bound of the subject confirmation.
    #[must_use]
    pub fn not_on_or_after_subject_confirmation(&self) -> &str {
        &self.not_on_or_after_subject_confirmation
    }
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format(INSTANT_FORMAT).to_string()
}
