//! Lookup tables over the accepted CA records.

use std::collections::HashMap;

use generational_arena::Index;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::domain::arena::HierarchyArena;
use crate::domain::entities::{CaRecord, RawCaRecord};

/// Why a raw record was left out of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum SkipReason {
    MissingId,
    /// Carries the repeated id
    DuplicateId(String),
    /// The entry could not be decoded; carries the decoder message
    Malformed(String),
}

/// A malformed input record, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// Position in the raw input
    pub position: usize,
    pub reason: SkipReason,
}

/// id → node and subject → node tables, backed by the resolution arena.
#[derive(Debug, Default)]
pub struct RecordIndex {
    arena: HierarchyArena,
    by_id: HashMap<String, Index>,
    by_subject: HashMap<String, Index>,
    skipped: Vec<SkippedRecord>,
}

impl RecordIndex {
    /// Index raw records, skipping malformed ones and those without a usable id.
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = RawCaRecord>,
    {
        Self::from_candidates(records.into_iter().map(admit))
    }

    /// Index already validated records.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = CaRecord>,
    {
        Self::from_candidates(records.into_iter().map(Ok))
    }

    #[instrument(level = "debug", skip_all)]
    fn from_candidates(candidates: impl Iterator<Item = Result<CaRecord, SkipReason>>) -> Self {
        let (lower, _) = candidates.size_hint();
        let mut index = Self {
            arena: HierarchyArena::with_capacity(lower),
            ..Self::default()
        };

        for (position, candidate) in candidates.enumerate() {
            let candidate = candidate.and_then(|r| {
                if r.id.trim().is_empty() {
                    Err(SkipReason::MissingId)
                } else {
                    Ok(r)
                }
            });
            let record = match candidate {
                Ok(r) => r,
                Err(reason) => {
                    warn!(position, ?reason, "skipping CA record");
                    index.skipped.push(SkippedRecord { position, reason });
                    continue;
                }
            };
            if index.by_id.contains_key(&record.id) {
                warn!(position, id = %record.id, "skipping CA record with duplicate id");
                index.skipped.push(SkippedRecord {
                    position,
                    reason: SkipReason::DuplicateId(record.id),
                });
                continue;
            }

            let id = record.id.clone();
            let subject = record.subject_name.clone();
            let idx = index.arena.insert_record(record, position);
            index.by_id.insert(id, idx);
            if !subject.is_empty() {
                // first record carrying a subject owns it
                index.by_subject.entry(subject).or_insert(idx);
            }
        }

        debug!(
            indexed = index.arena.len(),
            subjects = index.by_subject.len(),
            skipped = index.skipped.len(),
            "record index built"
        );
        index
    }

    pub fn by_id(&self, id: &str) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    pub fn by_subject(&self, subject: &str) -> Option<Index> {
        if subject.is_empty() {
            return None;
        }
        self.by_subject.get(subject).copied()
    }

    pub fn arena(&self) -> &HierarchyArena {
        &self.arena
    }

    pub(crate) fn arena_mut(&mut self) -> &mut HierarchyArena {
        &mut self.arena
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    pub(crate) fn take_skipped(&mut self) -> Vec<SkippedRecord> {
        std::mem::take(&mut self.skipped)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

fn admit(mut raw: RawCaRecord) -> Result<CaRecord, SkipReason> {
    if let Some(detail) = raw.defect.take() {
        return Err(SkipReason::Malformed(detail));
    }
    CaRecord::from_raw(raw).ok_or(SkipReason::MissingId)
}
