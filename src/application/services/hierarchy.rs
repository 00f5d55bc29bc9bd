//! CA hierarchy service
//!
//! Owns the raw record collection and its resolution, and runs the display
//! pipeline (filter → sort → flatten / paginate) on request. The resolver
//! only re-runs when the record collection is replaced.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{
    filter_forest, filter_records, flatten, paginate, resolve, serialize_forest, sort_forest,
    sort_records, CaRecord, ExpandedSet, Forest, LinkKind, OrphanReason, RawCaRecord,
    Resolution, SortDirection, SortKey, TextQuery,
};
use crate::infrastructure::traits::RecordSource;

/// Display parameters for one recomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub filter: Option<TextQuery>,
    pub sort: Option<(SortKey, SortDirection)>,
    /// 1-indexed orphan page
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            filter: None,
            sort: None,
            page: 1,
            page_size: 10,
        }
    }
}

impl ViewQuery {
    /// Query carrying the configured sort order and page size.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            filter: None,
            sort: Some((settings.sort.key, settings.sort.direction)),
            page: 1,
            page_size: settings.page_size,
        }
    }

    pub fn with_filter(mut self, query: TextQuery) -> Self {
        self.filter = (!query.is_empty()).then_some(query);
        self
    }

    pub fn with_sort(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort = Some((key, direction));
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Flattened forest row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForestRow {
    pub ref_id: String,
    pub record: CaRecord,
    pub level: usize,
    pub link: Option<LinkKind>,
    pub has_children: bool,
    pub expanded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanRow {
    pub record: CaRecord,
    pub reason: Option<OrphanReason>,
}

/// Everything the display layer needs for one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyView {
    pub forest_rows: Vec<ForestRow>,
    pub orphan_rows: Vec<OrphanRow>,
    pub orphan_total_pages: usize,
    /// Filtered and sorted forest
    #[serde(serialize_with = "serialize_forest")]
    pub forest: Forest,
    /// Filtered and sorted orphans, all pages
    pub orphans: Vec<CaRecord>,
    pub skipped_count: usize,
}

/// Service running the CA hierarchy pipeline.
pub struct HierarchyService {
    source: Option<Arc<dyn RecordSource>>,
    resolution: Resolution,
}

impl HierarchyService {
    /// Create a service over an already fetched record collection.
    pub fn new(records: Vec<RawCaRecord>) -> Self {
        Self {
            source: None,
            resolution: resolve(records),
        }
    }

    /// Create a service bound to a record source. Call [`Self::refresh`] or
    /// [`Self::try_refresh`] to fetch.
    pub fn with_source(source: Arc<dyn RecordSource>) -> Self {
        Self {
            source: Some(source),
            resolution: Resolution::default(),
        }
    }

    /// Replace the record collection and rebuild the hierarchy from scratch.
    #[instrument(level = "debug", skip_all)]
    pub fn replace_records(&mut self, records: Vec<RawCaRecord>) {
        debug!("replace_records: {} records", records.len());
        self.resolution = resolve(records);
    }

    /// Re-fetch from the source, propagating fetch failures.
    pub fn try_refresh(&mut self) -> ApplicationResult<()> {
        let Some(source) = self.source.clone() else {
            return Ok(());
        };
        let records = source
            .fetch()
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("fetch CA records from {}", source.describe()),
                source: Box::new(e),
            })?;
        self.replace_records(records);
        Ok(())
    }

    /// Re-fetch from the source; a failing fetch yields an empty hierarchy.
    pub fn refresh(&mut self) {
        if let Err(e) = self.try_refresh() {
            warn!("{e}, continuing with empty record collection");
            self.replace_records(Vec::new());
        }
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Run filter → sort → flatten / paginate over the cached resolution.
    #[instrument(level = "debug", skip(self, expanded))]
    pub fn view(&self, query: &ViewQuery, expanded: &ExpandedSet) -> HierarchyView {
        let (mut forest, mut orphans) = match &query.filter {
            Some(q) => (
                filter_forest(&self.resolution.forest, |r| q.matches(r)),
                filter_records(&self.resolution.orphans, |r| q.matches(r)),
            ),
            None => (
                self.resolution.forest.clone(),
                self.resolution.orphans.clone(),
            ),
        };

        if let Some((key, direction)) = query.sort {
            forest = sort_forest(&forest, key, direction);
            orphans = sort_records(&orphans, key, direction);
        }

        let forest_rows = flatten(&forest, expanded)
            .into_iter()
            .map(|row| ForestRow {
                ref_id: row.node.ref_id.clone(),
                record: row.node.record.clone(),
                level: row.level,
                link: row.node.link,
                has_children: !row.node.is_leaf(),
                expanded: row.is_expanded(expanded),
            })
            .collect();

        let page = paginate(&orphans, query.page, query.page_size);
        let orphan_rows = page
            .rows
            .iter()
            .map(|record| OrphanRow {
                reason: self.resolution.orphan_reason(&record.id),
                record: record.clone(),
            })
            .collect();
        let orphan_total_pages = page.total_pages;

        HierarchyView {
            forest_rows,
            orphan_rows,
            orphan_total_pages,
            forest,
            orphans,
            skipped_count: self.resolution.skipped_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawId;
    use crate::infrastructure::{InfraError, InfraResult};

    fn raw(id: &str, name: &str, subject: &str, issuer: &str) -> RawCaRecord {
        RawCaRecord {
            id: Some(RawId::Text(id.to_string())),
            name: name.to_string(),
            subject_name: Some(subject.to_string()),
            issuer_name: Some(issuer.to_string()),
            ..RawCaRecord::default()
        }
    }

    struct FailingSource;

    impl RecordSource for FailingSource {
        fn fetch(&self) -> InfraResult<Vec<RawCaRecord>> {
            Err(InfraError::io(
                "fetch",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down"),
            ))
        }

        fn describe(&self) -> String {
            "failing".into()
        }
    }

    #[test]
    fn given_failing_source_when_refreshing_then_empty_hierarchy() {
        let mut service = HierarchyService::with_source(Arc::new(FailingSource));
        service.replace_records(vec![raw("1", "Root", "CN=Root", "CN=Root")]);

        service.refresh();

        assert!(service.resolution().forest.is_empty());
        assert!(service.resolution().orphans.is_empty());
        assert!(service.try_refresh().is_err());
    }

    #[test]
    fn given_filter_and_sort_when_viewing_then_rows_reflect_both() {
        let service = HierarchyService::new(vec![
            raw("root", "Root", "CN=Root", "CN=Root"),
            raw("b", "Beta Issuing", "CN=B", "CN=Root"),
            raw("a", "Alpha Issuing", "CN=A", "CN=Root"),
            raw("x", "Lonely", "CN=X", "CN=Nobody"),
        ]);
        let expanded: ExpandedSet = ["root"].into_iter().collect();
        let query = ViewQuery::default()
            .with_filter(TextQuery::new("issuing"))
            .with_sort(SortKey::Name, SortDirection::Asc);

        let view = service.view(&query, &expanded);

        let rows: Vec<(&str, usize)> = view
            .forest_rows
            .iter()
            .map(|r| (r.ref_id.as_str(), r.level))
            .collect();
        assert_eq!(rows, vec![("root", 0), ("a", 1), ("b", 1)]);
        assert!(view.forest_rows[0].expanded);
        assert_eq!(view.forest_rows[1].link, Some(LinkKind::Inferred));
        assert!(view.orphan_rows.is_empty());
        assert_eq!(view.orphan_total_pages, 0);
    }

    #[test]
    fn given_orphans_when_viewing_then_paged_with_reasons() {
        let service = HierarchyService::new(vec![
            raw("x", "X", "CN=X", "CN=Nobody"),
            raw("y", "Y", "CN=Y", "CN=Nobody"),
            raw("z", "Z", "CN=Z", "CN=Nobody"),
        ]);
        let query = ViewQuery::default().with_page_size(2).with_page(2);

        let view = service.view(&query, &ExpandedSet::new());

        assert_eq!(view.orphan_total_pages, 2);
        assert_eq!(view.orphan_rows.len(), 1);
        assert_eq!(view.orphan_rows[0].record.id, "z");
        assert_eq!(view.orphan_rows[0].reason, Some(OrphanReason::NoIssuerMatch));
        assert_eq!(view.orphans.len(), 3);
    }

    #[test]
    fn given_settings_when_building_query_then_uses_configured_defaults() {
        let mut settings = Settings::default();
        settings.page_size = 25;
        settings.sort.direction = SortDirection::Desc;

        let query = ViewQuery::from_settings(&settings).with_filter(TextQuery::new(""));

        assert_eq!(query.page_size, 25);
        assert_eq!(query.sort, Some((SortKey::Name, SortDirection::Desc)));
        assert!(query.filter.is_none());
    }
}
