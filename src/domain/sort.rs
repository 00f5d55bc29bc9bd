//! Level-preserving sort of forests and flat sort of orphans.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::entities::CaRecord;
use crate::domain::error::DomainError;
use crate::domain::tree::{fold_forest, Forest, TreeNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    Subject,
    Issuer,
    Status,
    Type,
    CertCount,
    Expiry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortKey {
    /// Three-way compare of two records on this key, ascending.
    pub fn compare(self, a: &CaRecord, b: &CaRecord) -> Ordering {
        match self {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Subject => a.subject_name.cmp(&b.subject_name),
            SortKey::Issuer => a.issuer_name.cmp(&b.issuer_name),
            SortKey::Status => a.status.cmp(&b.status),
            SortKey::Type => a.kind.cmp(&b.kind),
            SortKey::CertCount => a.cert_count.cmp(&b.cert_count),
            SortKey::Expiry => compare_expiry(a, b),
        }
    }
}

/// Parsed dates first, in date order; unparseable or missing expiries after
/// them, compared as raw strings.
fn compare_expiry(a: &CaRecord, b: &CaRecord) -> Ordering {
    match (a.expiry_date(), b.expiry_date()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.expiry.cmp(&b.expiry),
    }
}

impl SortDirection {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(SortKey::Name),
            "subject" | "subject_name" => Ok(SortKey::Subject),
            "issuer" | "issuer_name" => Ok(SortKey::Issuer),
            "status" => Ok(SortKey::Status),
            "type" | "kind" => Ok(SortKey::Type),
            "cert_count" | "certcount" | "certs" => Ok(SortKey::CertCount),
            "expiry" => Ok(SortKey::Expiry),
            _ => Err(DomainError::UnknownSortKey(s.to_string())),
        }
    }
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(DomainError::UnknownSortDirection(s.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortKey::Name => "name",
            SortKey::Subject => "subject",
            SortKey::Issuer => "issuer",
            SortKey::Status => "status",
            SortKey::Type => "type",
            SortKey::CertCount => "cert_count",
            SortKey::Expiry => "expiry",
        };
        f.write_str(s)
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

/// Sort roots and every children list on its own.
///
/// Nodes never move across levels. The sort is stable, also when descending.
pub fn sort_forest(forest: &[TreeNode], key: SortKey, direction: SortDirection) -> Forest {
    let by_key = |a: &TreeNode, b: &TreeNode| direction.apply(key.compare(&a.record, &b.record));
    let mut sorted = fold_forest(forest, |node, mut children: Vec<TreeNode>| {
        children.sort_by(by_key);
        node.with_children(children)
    });
    sorted.sort_by(by_key);
    sorted
}

/// Flat stable sort for orphan lists.
pub fn sort_records(records: &[CaRecord], key: SortKey, direction: SortDirection) -> Vec<CaRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| direction.apply(key.compare(a, b)));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tree::fixtures::{node, record};
    use rstest::rstest;

    fn names(forest: &[TreeNode]) -> Vec<&str> {
        forest.iter().map(|n| n.record.name.as_str()).collect()
    }

    #[test]
    fn given_forest_when_sorting_then_each_level_sorted_independently() {
        let forest = vec![
            node("2", "b-root", vec![node("21", "z", vec![]), node("22", "a", vec![])]),
            node("1", "a-root", vec![node("11", "y", vec![node("111", "c", vec![])])]),
        ];

        let sorted = sort_forest(&forest, SortKey::Name, SortDirection::Asc);

        assert_eq!(names(&sorted), vec!["a-root", "b-root"]);
        assert_eq!(names(&sorted[1].children), vec!["a", "z"]);
        // grandchild "c" sorts before "y" by name but stays below it
        assert_eq!(names(&sorted[0].children), vec!["y"]);
        assert_eq!(names(&sorted[0].children[0].children), vec!["c"]);
    }

    #[test]
    fn given_ties_when_sorting_descending_then_keeps_prior_order() {
        let mut a = record("a", "first");
        let mut b = record("b", "second");
        let mut c = record("c", "third");
        a.cert_count = 5;
        b.cert_count = 5;
        c.cert_count = 9;

        let sorted = sort_records(&[a, b, c], SortKey::CertCount, SortDirection::Desc);
        let ids: Vec<&str> = sorted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn given_mixed_expiries_when_sorting_then_parsed_dates_first() {
        let mut a = record("a", "a");
        let mut b = record("b", "b");
        let mut c = record("c", "c");
        a.expiry = Some("not a date".into());
        b.expiry = Some("2031-01-01".into());
        c.expiry = Some("2029-05-05T00:00:00Z".into());

        let sorted = sort_records(&[a, b, c], SortKey::Expiry, SortDirection::Asc);
        let ids: Vec<&str> = sorted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[rstest]
    #[case("name", SortKey::Name)]
    #[case("Subject", SortKey::Subject)]
    #[case("cert-count", SortKey::CertCount)]
    #[case("expiry", SortKey::Expiry)]
    fn given_key_name_when_parsing_then_returns_key(#[case] input: &str, #[case] expected: SortKey) {
        assert_eq!(input.parse::<SortKey>(), Ok(expected));
    }

    #[test]
    fn given_unknown_names_when_parsing_then_errors() {
        assert_eq!(
            "color".parse::<SortKey>(),
            Err(DomainError::UnknownSortKey("color".into()))
        );
        assert!("sideways".parse::<SortDirection>().is_err());
        assert_eq!("DESC".parse::<SortDirection>(), Ok(SortDirection::Desc));
    }
}
