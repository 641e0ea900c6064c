//! Resident directory and delivery visitor records

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verification code attached to every delivery stub.
///
/// Carrier detection is a keyword match only. Nothing is checked against a
/// real order, so this code must not be treated as proof of identity.
pub const UNVERIFIED_APPROVAL_CODE: &str = "APPROVED";

/// A person who lives in the building and can receive bridged calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    /// Display name, also matched against the transcript
    pub name: String,

    /// E.164 phone number the call is bridged to
    pub phone_number: String,

    /// Alternate spellings a transcriber may produce
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Resident {
    /// Create a resident record
    #[must_use]
    pub fn new(name: impl Into<String>, phone_number: impl Into<String>, aliases: &[&str]) -> Self {
        Self {
            name: name.into(),
            phone_number: phone_number.into(),
            aliases: aliases.iter().map(ToString::to_string).collect(),
        }
    }

    /// Primary name followed by aliases, in directory order
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// A delivery visitor synthesized from a carrier keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryPerson {
    pub order_id: String,
    /// Carrier that was mentioned
    pub name: String,
    pub expected_arrival: DateTime<Utc>,
    pub phone_number: Option<String>,
    pub verification_code: String,
}

impl DeliveryPerson {
    /// Build the unverified stub for a detected carrier
    #[must_use]
    pub fn unverified(carrier: &str) -> Self {
        Self {
            order_id: format!("{carrier}-unverified"),
            name: carrier.to_string(),
            expected_arrival: Utc::now(),
            phone_number: None,
            verification_code: UNVERIFIED_APPROVAL_CODE.to_string(),
        }
    }
}

/// Immutable, ordered resident roster shared across calls
#[derive(Debug, Clone)]
pub struct Directory {
    residents: Arc<[Resident]>,
}

impl Directory {
    /// Create a directory from an ordered list of residents
    #[must_use]
    pub fn new(residents: Vec<Resident>) -> Self {
        Self {
            residents: residents.into(),
        }
    }

    /// Residents in lookup order
    #[must_use]
    pub fn residents(&self) -> &[Resident] {
        &self.residents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.residents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.residents.is_empty()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new(vec![
            Resident::new("Matt", "+15555550101", &["matthew", "matty"]),
            Resident::new("Lindsay", "+15555550102", &["lindsey", "lyndsay"]),
        ])
    }
}
