//! The submission record and the types that surround its lifecycle.
//!
//! A record is created by the remote store from a [`SubmissionPayload`],
//! delivered to the engine by the initial load or the change feed, and
//! afterwards only its `revealed` flag ever changes (via a
//! [`SubmissionPatch`]).

use crate::{Error, Result, SubmissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label used when grouping records that carry no location tag.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Which simulation message design produced a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variant {
    #[serde(rename = "variant_a")]
    A,
    #[serde(rename = "variant_b")]
    B,
}

impl Variant {
    /// Both variants in display order.
    pub const ALL: [Variant; 2] = [Variant::A, Variant::B];

    /// The datastore value (`variant_a` / `variant_b`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Variant::A => "variant_a",
            Variant::B => "variant_b",
        }
    }

    /// Human label used by charts ("Variant A").
    pub const fn label(&self) -> &'static str {
        match self {
            Variant::A => "Variant A",
            Variant::B => "Variant B",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "variant_a" | "a" => Ok(Variant::A),
            "variant_b" | "b" => Ok(Variant::B),
            _ => Err(Error::InvalidVariant(s.to_string())),
        }
    }
}

/// The QR code a visitor scanned. Safe codes capture under variant A,
/// malicious-looking codes under variant B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QrSource {
    Safe,
    Malicious,
}

impl From<QrSource> for Variant {
    fn from(source: QrSource) -> Self {
        match source {
            QrSource::Safe => Variant::A,
            QrSource::Malicious => Variant::B,
        }
    }
}

/// A stored submission.
///
/// Serializes with camelCase field names; deserializes from either that
/// shape or the datastore's snake_case rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub email: String,
    pub variant: Variant,
    #[serde(default, alias = "location_tag")]
    pub location_tag: Option<String>,
    #[serde(default, alias = "ip_address")]
    pub ip_address: Option<String>,
    #[serde(default, alias = "user_agent")]
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub revealed: bool,
}

impl SubmissionRecord {
    /// Builds a record as the store would on insert.
    pub fn from_payload(
        id: SubmissionId,
        timestamp: DateTime<Utc>,
        payload: SubmissionPayload,
    ) -> Self {
        Self {
            id,
            email: payload.email,
            variant: payload.variant,
            location_tag: payload.location_tag,
            ip_address: payload.ip_address,
            user_agent: payload.user_agent,
            timestamp,
            revealed: false,
        }
    }

    /// The location tag if present and non-empty.
    pub fn location(&self) -> Option<&str> {
        self.location_tag.as_deref().filter(|tag| !tag.is_empty())
    }

    /// The grouping label: the tag, or [`UNKNOWN_LOCATION`].
    pub fn location_label(&self) -> &str {
        self.location().unwrap_or(UNKNOWN_LOCATION)
    }

    /// Applies a partial update. Returns true if anything changed.
    pub fn apply_patch(&mut self, patch: &SubmissionPatch) -> bool {
        match patch.revealed {
            Some(revealed) if revealed != self.revealed => {
                self.revealed = revealed;
                true
            }
            _ => false,
        }
    }
}

/// Raw input from the portal form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionForm {
    pub email: String,
    #[serde(default)]
    pub location_tag: Option<String>,
}

/// What the engine asks the store to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub email: String,
    pub variant: Variant,
    pub location_tag: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl SubmissionPayload {
    /// Normalizes a form into a payload.
    ///
    /// The email is trimmed and must look like an address. A blank location
    /// falls back to `default_location` (the tag baked into the QR route).
    pub fn from_form(
        form: &SubmissionForm,
        source: QrSource,
        default_location: Option<&str>,
        user_agent: Option<String>,
    ) -> Result<Self> {
        let email = form.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::InvalidEmail(form.email.clone()));
        }

        let location_tag = form
            .location_tag
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .or(default_location.map(str::trim).filter(|tag| !tag.is_empty()))
            .map(str::to_string);

        Ok(Self {
            email: email.to_string(),
            variant: source.into(),
            location_tag,
            // Captured server-side or by the best-effort resolver.
            ip_address: None,
            user_agent,
        })
    }

    /// Attaches a resolved client IP.
    #[must_use]
    pub fn with_ip_address(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }
}

/// Partial fields for a remote update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revealed: Option<bool>,
}

impl SubmissionPatch {
    /// A patch that sets the reveal flag.
    pub const fn revealed(revealed: bool) -> Self {
        Self {
            revealed: Some(revealed),
        }
    }
}
