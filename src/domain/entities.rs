//! Domain entities: CA records as delivered by the data-fetch layer

use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle state of a certificate authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaStatus {
    Active,
    Pending,
    Disabled,
    Expired,
    Revoked,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for CaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaStatus::Active => "active",
            CaStatus::Pending => "pending",
            CaStatus::Disabled => "disabled",
            CaStatus::Expired => "expired",
            CaStatus::Revoked => "revoked",
            CaStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Record identifier as it appears on the wire: the API hands out both
/// numeric and string ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    /// Normalized string form, `None` for blank ids.
    pub fn normalized(&self) -> Option<String> {
        match self {
            RawId::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            RawId::Number(n) => Some(n.to_string()),
        }
    }
}

/// CA record exactly as received; every field may be missing or `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCaRecord {
    pub id: Option<RawId>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    pub subject_name: Option<String>,
    pub issuer_name: Option<String>,
    pub parent_id: Option<RawId>,
    #[serde(deserialize_with = "null_as_default")]
    pub status: CaStatus,
    #[serde(deserialize_with = "null_as_default")]
    pub cert_count: u64,
    pub expiry: Option<String>,
    /// Set by the data-fetch layer when the record could not be decoded
    #[serde(skip)]
    pub defect: Option<String>,
}

impl RawCaRecord {
    /// Placeholder for an input entry that could not be decoded.
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            defect: Some(detail.into()),
            ..Self::default()
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A validated CA record: it always carries a non-blank id.
///
/// Records are immutable input to the resolver; transforms clone them into
/// new trees instead of patching them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub subject_name: String,
    pub issuer_name: String,
    pub parent_id: Option<String>,
    pub status: CaStatus,
    pub cert_count: u64,
    pub expiry: Option<String>,
}

impl CaRecord {
    /// Promote a raw record. Returns `None` when the id is missing or blank.
    pub fn from_raw(raw: RawCaRecord) -> Option<Self> {
        let id = raw.id.as_ref().and_then(RawId::normalized)?;
        Some(Self {
            id,
            name: raw.name,
            kind: raw.kind,
            subject_name: raw.subject_name.unwrap_or_default(),
            issuer_name: raw.issuer_name.unwrap_or_default(),
            parent_id: raw.parent_id.as_ref().and_then(RawId::normalized),
            status: raw.status,
            cert_count: raw.cert_count,
            expiry: raw.expiry,
        })
    }

    /// Subject and issuer are both present and identical.
    pub fn is_self_signed(&self) -> bool {
        !self.subject_name.is_empty() && self.subject_name == self.issuer_name
    }

    /// Parsed expiry date.
    ///
    /// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates.
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        let raw = self.expiry.as_deref()?.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.date_naive());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}

impl fmt::Display for CaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}", self.name)
        }
    }
}
