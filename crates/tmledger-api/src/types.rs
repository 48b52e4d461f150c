//! mail.tm resource types.
//!
//! The API speaks JSON-LD (Hydra). Collections arrive wrapped in a
//! `hydra:member` array; with a plain `application/json` accept header the
//! same endpoints return a bare array, so both shapes are decoded.
//!
//! Message fields are decoded leniently: a field with an unexpected type or
//! a `null` value falls back to its default instead of failing the listing.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Subject used when a message has none.
pub const NO_SUBJECT: &str = "(no subject)";

/// Sender shown when a message carries no sender address.
pub const UNKNOWN_SENDER: &str = "Unknown sender";

/// A collection response, either Hydra-wrapped or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Collection<T> {
    Hydra {
        #[serde(rename = "hydra:member")]
        member: Vec<T>,
    },
    Plain(Vec<T>),
}

impl<T> Collection<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Hydra { member } => member,
            Self::Plain(items) => items,
        }
    }
}

/// Decodes a field, yielding `None` when it is null or of the wrong type.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Like [`lenient`], falling back to `T::default()`.
fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// A domain mailboxes can be registered on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Resource identifier.
    #[serde(default)]
    pub id: String,
    /// Domain name (e.g. `example.mail.tm`).
    pub domain: String,
    /// Whether new accounts can be created on it.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Bearer token returned by `POST /token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Account identifier.
    #[serde(default)]
    pub id: String,
    /// Bearer token value.
    pub token: String,
}

/// Raw token body; `token` may be missing on malformed responses.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub token: Option<String>,
}

/// An email address with optional display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Mailbox address.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub address: String,
    /// Display name.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub name: String,
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} <{}>", self.name, self.address)
        }
    }
}

/// Inbox listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    /// Message identifier.
    pub id: String,
    /// Sender.
    pub from: Address,
    /// Subject line ([`NO_SUBJECT`] when absent).
    pub subject: String,
    /// Short preview of the body.
    pub intro: String,
    /// Whether the message was opened.
    pub seen: bool,
    /// Creation time, when the server sent a parseable one.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawMessageSummary {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    from: Option<Address>,
    #[serde(default, deserialize_with = "lenient")]
    subject: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    intro: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    seen: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    created_at: Option<String>,
}

impl RawMessageSummary {
    /// Decodes one listing entry. Entries that are not objects are skipped.
    pub(crate) fn from_entry(entry: serde_json::Value) -> Option<MessageSummary> {
        serde_json::from_value::<Self>(entry).ok()?.normalize()
    }

    /// Normalizes a listing entry. Entries without an id are dropped.
    pub(crate) fn normalize(self) -> Option<MessageSummary> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let mut from = self.from.unwrap_or_default();
        if from.address.is_empty() {
            from.address = UNKNOWN_SENDER.to_string();
        }
        Some(MessageSummary {
            id,
            from,
            subject: self.subject.unwrap_or_else(|| NO_SUBJECT.to_string()),
            intro: self.intro.unwrap_or_default(),
            seen: self.seen.unwrap_or_default(),
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
        })
    }
}

/// Full message returned by `GET /messages/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    /// Message identifier.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub id: String,
    /// Sender.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub from: Address,
    /// Subject line.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub subject: String,
    /// Plain text body.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub text: String,
    /// HTML body parts.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub html: Vec<String>,
    /// Raw creation timestamp.
    #[serde(default, rename = "createdAt", deserialize_with = "lenient")]
    created_at_raw: Option<String>,
}

impl MessageDetail {
    /// Returns the readable body: the text part, else the joined HTML parts.
    #[must_use]
    pub fn body(&self) -> Option<String> {
        if !self.text.trim().is_empty() {
            return Some(self.text.clone());
        }
        let html = self.html.join("\n");
        if html.trim().is_empty() {
            None
        } else {
            Some(html)
        }
    }

    /// Creation time, when the server sent a parseable one.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at_raw.as_deref().and_then(parse_timestamp)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Error body returned by the API on failures.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default, rename = "hydra:description")]
    description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    /// Extracts the most specific message from an error body, if it is JSON.
    pub(crate) fn detail_from(body: &str) -> Option<String> {
        let parsed: Self = serde_json::from_str(body).ok()?;
        parsed
            .detail
            .or(parsed.description)
            .or(parsed.message)
            .filter(|d| !d.is_empty())
    }
}
