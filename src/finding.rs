//! Findings
//!
//! TigerStyle: Explicit types, validation before persistence.
//!
//! A finding is one security issue reported by a scanner. Findings coming
//! out of a parser may lack an id or parse time; `stamp` fills both in and
//! `validate` checks the required fields before anything is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::FINDING_NAME_BYTES_MAX;

// =============================================================================
// Severity
// =============================================================================

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Informational,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Informational => "INFORMATIONAL",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Finding
// =============================================================================

/// A single scan finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Unique identifier, assigned by `stamp` if missing
    #[serde(default)]
    pub id: Uuid,
    /// When the scanner identified the finding (often unknown)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identified_at: Option<DateTime<Utc>>,
    /// When the finding was parsed
    #[serde(default)]
    pub parsed_at: Option<DateTime<Utc>>,
    /// Short description
    pub name: String,
    /// In-depth description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grouping category, e.g. "Open Port"
    pub category: String,
    /// Severity
    pub severity: Severity,
    /// Scanner-specific attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Map<String, serde_json::Value>>,
    /// Full URL of the affected location, with scheme (e.g. `tcp://host:port`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Finding {
    /// Create a finding with the required fields set. Id and parse time are
    /// left for `stamp`.
    pub fn new(name: impl Into<String>, category: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: Uuid::nil(),
            identified_at: None,
            parsed_at: None,
            name: name.into(),
            description: None,
            category: category.into(),
            severity,
            attributes: None,
            location: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the location URL.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the identification time.
    pub fn with_identified_at(mut self, at: DateTime<Utc>) -> Self {
        self.identified_at = Some(at);
        self
    }

    /// Assign a fresh id and set the parse time to `now`.
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        self.id = Uuid::new_v4();
        self.parsed_at = Some(now);
    }

    /// Check the fields required before persistence.
    pub fn validate(&self) -> Result<(), FindingError> {
        if self.id.is_nil() {
            return Err(FindingError::MissingId);
        }
        if self.parsed_at.is_none() {
            return Err(FindingError::MissingParsedAt { id: self.id });
        }
        if self.name.trim().is_empty() {
            return Err(FindingError::EmptyName { id: self.id });
        }
        if self.name.len() > FINDING_NAME_BYTES_MAX {
            return Err(FindingError::NameTooLong {
                len: self.name.len(),
                max: FINDING_NAME_BYTES_MAX,
            });
        }
        if self.category.trim().is_empty() {
            return Err(FindingError::EmptyCategory { id: self.id });
        }
        if let Some(location) = &self.location {
            if let Err(e) = Url::parse(location) {
                return Err(FindingError::InvalidLocation {
                    id: self.id,
                    location: location.clone(),
                    reason: e.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Assign ids and parse times to every finding.
pub fn stamp_all(findings: &mut [Finding], now: DateTime<Utc>) {
    for finding in findings.iter_mut() {
        finding.stamp(now);
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Finding validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FindingError {
    #[error("finding has no id")]
    MissingId,

    #[error("finding {id} has no parse time")]
    MissingParsedAt { id: Uuid },

    #[error("finding {id} has an empty name")]
    EmptyName { id: Uuid },

    #[error("finding name too long: {len} > {max}")]
    NameTooLong { len: usize, max: usize },

    #[error("finding {id} has an empty category")]
    EmptyCategory { id: Uuid },

    #[error("finding {id} has an invalid location '{location}': {reason}")]
    InvalidLocation {
        id: Uuid,
        location: String,
        reason: String,
    },
}

// =============================================================================
// Tests
// =============================================================================
