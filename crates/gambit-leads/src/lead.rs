//! Lead records and submission payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{EmailAddress, LeadError};

/// A captured lead as persisted in the collection file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Submitted address, unique within the collection.
    pub email: String,
    /// Where the submission came from.
    pub source: String,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Stamp a validated submission with the current time.
    pub fn new(email: EmailAddress, source: impl Into<String>) -> Self {
        Self {
            email: email.into_inner(),
            source: source.into(),
            created_at: Utc::now(),
        }
    }
}

/// Raw `POST /api/lead` body. Both fields are optional on the wire, and a
/// field holding anything other than a string reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LeadSubmission {
    #[serde(default, deserialize_with = "string_or_absent")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_absent")]
    pub source: Option<String>,
}

fn string_or_absent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

impl LeadSubmission {
    /// Submission with an email and no source.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            source: None,
        }
    }

    /// Set the source tag.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Validate into a `NewLead`.
    pub fn validate(self) -> Result<NewLead, LeadError> {
        let email = self.email.ok_or(LeadError::InvalidEmail)?;
        Ok(NewLead {
            email: EmailAddress::parse(email)?,
            source: self.source,
        })
    }
}

/// A submission whose email passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    pub email: EmailAddress,
    pub source: Option<String>,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The lead was appended and the collection rewritten.
    Saved(Lead),
    /// The email was already present; nothing was written.
    AlreadySubscribed,
}

impl SubmitOutcome {
    /// Message reported to the caller.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Saved(_) => "Lead saved",
            Self::AlreadySubscribed => "Already subscribed",
        }
    }

    /// The stored lead, if one was written.
    pub fn lead(&self) -> Option<&Lead> {
        match self {
            Self::Saved(lead) => Some(lead),
            Self::AlreadySubscribed => None,
        }
    }
}
