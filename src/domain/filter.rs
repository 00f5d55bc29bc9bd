//! Predicate pruning of forests and orphan lists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::entities::CaRecord;
use crate::domain::error::DomainError;
use crate::domain::tree::{fold_forest, Forest, TreeNode};

/// Keep every node whose record matches, plus the ancestors of any match.
///
/// Returns a pruned copy; `forest` is left untouched.
pub fn filter_forest<P>(forest: &[TreeNode], predicate: P) -> Forest
where
    P: Fn(&CaRecord) -> bool,
{
    fold_forest(forest, |node, children: Vec<Option<TreeNode>>| {
        let children: Vec<TreeNode> = children.into_iter().flatten().collect();
        if children.is_empty() && !predicate(&node.record) {
            None
        } else {
            Some(node.with_children(children))
        }
    })
    .into_iter()
    .flatten()
    .collect()
}

/// Flat filter for orphans: the predicate applies directly.
pub fn filter_records<P>(records: &[CaRecord], predicate: P) -> Vec<CaRecord>
where
    P: Fn(&CaRecord) -> bool,
{
    records.iter().filter(|&r| predicate(r)).cloned().collect()
}

/// Record field a [`TextQuery`] looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Id,
    Name,
    Subject,
    Issuer,
    Status,
    Type,
}

impl FilterField {
    fn value(self, record: &CaRecord) -> String {
        match self {
            FilterField::Id => record.id.clone(),
            FilterField::Name => record.name.clone(),
            FilterField::Subject => record.subject_name.clone(),
            FilterField::Issuer => record.issuer_name.clone(),
            FilterField::Status => record.status.to_string(),
            FilterField::Type => record.kind.clone(),
        }
    }
}

impl FromStr for FilterField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(FilterField::Id),
            "name" => Ok(FilterField::Name),
            "subject" | "subject_name" => Ok(FilterField::Subject),
            "issuer" | "issuer_name" => Ok(FilterField::Issuer),
            "status" => Ok(FilterField::Status),
            "type" | "kind" => Ok(FilterField::Type),
            _ => Err(DomainError::UnknownFilterField(s.to_string())),
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterField::Id => "id",
            FilterField::Name => "name",
            FilterField::Subject => "subject",
            FilterField::Issuer => "issuer",
            FilterField::Status => "status",
            FilterField::Type => "type",
        };
        f.write_str(s)
    }
}

/// Substring predicate over a set of record fields.
///
/// An empty needle matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextQuery {
    needle: String,
    fields: Vec<FilterField>,
    case_sensitive: bool,
}

impl TextQuery {
    /// Case-insensitive match on the name field.
    pub fn new(text: &str) -> Self {
        Self::with_fields(text, vec![FilterField::Name], false)
    }

    pub fn with_fields(text: &str, fields: Vec<FilterField>, case_sensitive: bool) -> Self {
        let needle = if case_sensitive {
            text.trim().to_string()
        } else {
            text.trim().to_lowercase()
        };
        Self {
            needle,
            fields,
            case_sensitive,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches(&self, record: &CaRecord) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        self.fields.iter().any(|field| {
            let value = field.value(record);
            if self.case_sensitive {
                value.contains(&self.needle)
            } else {
                value.to_lowercase().contains(&self.needle)
            }
        })
    }
}
