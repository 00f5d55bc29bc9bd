//! Reconstructs the CA forest from flat records.
//!
//! Every record is classified by the first matching rule:
//! 1. explicit `parentId` found in the index and not closing a cycle: child of that parent
//! 2. explicit `parentId` unknown or closing a cycle: orphan
//! 3. self-signed (subject == issuer, both non-empty): root
//! 4. issuer matches another record's subject: inferred child of that record
//! 5. anything else: orphan
//!
//! A node only ends up in the forest if its ancestor chain ends at a root.
//! Nodes hanging below an orphan are orphans too, so every accepted record
//! lands in exactly one of forest or orphan list.

use std::collections::{BTreeMap, HashMap, HashSet};

use generational_arena::Index;
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::domain::entities::{CaRecord, RawCaRecord};
use crate::domain::index::{RecordIndex, SkippedRecord};
use crate::domain::tree::{serialize_forest, Forest, LinkKind};

/// Why a record could not be placed in the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrphanReason {
    /// `parentId` names a record that does not exist
    MissingParent,
    /// Attaching the record would close a parent cycle
    Cycle,
    /// No explicit parent, not self-signed, and no subject matches the issuer
    NoIssuerMatch,
    /// Attached, but its ancestor chain ends at an orphan
    UnplacedAncestor,
}

/// Output of hierarchy resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    #[serde(serialize_with = "serialize_forest")]
    pub forest: Forest,
    /// Unplaced records in input order
    pub orphans: Vec<CaRecord>,
    /// Keyed by record id, ordered for stable serialized output
    pub orphan_reasons: BTreeMap<String, OrphanReason>,
    /// Malformed input records that were left out
    pub skipped: Vec<SkippedRecord>,
}

impl Resolution {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn orphan_reason(&self, id: &str) -> Option<OrphanReason> {
        self.orphan_reasons.get(id).copied()
    }

    /// Number of accepted records (forest nodes plus orphans).
    pub fn record_count(&self) -> usize {
        self.forest.iter().map(|n| n.size()).sum::<usize>() + self.orphans.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Root,
    Attach(Index, LinkKind),
    Orphan(OrphanReason),
}

/// Resolve raw records into a forest and an orphan list.
pub fn resolve(records: Vec<RawCaRecord>) -> Resolution {
    HierarchyResolver::new(RecordIndex::build(records)).resolve()
}

/// Resolve already validated records.
pub fn resolve_records(records: Vec<CaRecord>) -> Resolution {
    HierarchyResolver::new(RecordIndex::from_records(records)).resolve()
}

/// Applies the placement rules over a [`RecordIndex`].
pub struct HierarchyResolver {
    index: RecordIndex,
}

impl HierarchyResolver {
    pub fn new(index: RecordIndex) -> Self {
        Self { index }
    }

    #[instrument(level = "debug", skip_all)]
    pub fn resolve(mut self) -> Resolution {
        let order = self.index.arena().order().to_vec();
        let slot_of: HashMap<Index, usize> =
            order.iter().enumerate().map(|(slot, &idx)| (idx, slot)).collect();
        let mut roots = Vec::new();
        let mut reasons: HashMap<Index, OrphanReason> = HashMap::new();
        let mut candidates: Vec<Option<(usize, LinkKind)>> = vec![None; order.len()];

        for (slot, &idx) in order.iter().enumerate() {
            match self.classify(idx) {
                Placement::Root => roots.push(idx),
                Placement::Attach(parent, link) => {
                    candidates[slot] = slot_of.get(&parent).map(|&p| (p, link));
                }
                Placement::Orphan(reason) => {
                    reasons.insert(idx, reason);
                }
            }
        }

        for slot in closing_edges(&candidates) {
            trace!(slot, "attachment would close a cycle");
            candidates[slot] = None;
            reasons.insert(order[slot], OrphanReason::Cycle);
        }

        // Input order drives attachment, so children keep input order
        for (slot, candidate) in candidates.iter().enumerate() {
            if let Some((parent, link)) = *candidate {
                self.index.arena_mut().attach(order[slot], order[parent], link);
            }
        }

        let arena = self.index.arena();
        let placed: HashSet<Index> = arena.reachable_from(&roots).into_iter().collect();
        let forest: Forest = roots
            .iter()
            .filter_map(|&root| arena.build_subtree(root))
            .collect();

        let mut orphans = Vec::new();
        let mut orphan_reasons = BTreeMap::new();
        for idx in order.iter().filter(|idx| !placed.contains(idx)) {
            let Some(node) = arena.get_node(*idx) else {
                continue;
            };
            let reason = reasons
                .get(idx)
                .copied()
                .unwrap_or(OrphanReason::UnplacedAncestor);
            trace!(id = %node.record.id, ?reason, "orphan");
            orphan_reasons.insert(node.record.id.clone(), reason);
            orphans.push(node.record.clone());
        }

        debug!(
            roots = forest.len(),
            placed = placed.len(),
            orphans = orphans.len(),
            skipped = self.index.skipped().len(),
            "hierarchy resolved"
        );

        Resolution {
            forest,
            orphans,
            orphan_reasons,
            skipped: self.index.take_skipped(),
        }
    }

    fn classify(&self, idx: Index) -> Placement {
        let Some(node) = self.index.arena().get_node(idx) else {
            return Placement::Orphan(OrphanReason::NoIssuerMatch);
        };
        let record = &node.record;

        if let Some(parent_id) = record.parent_id.as_deref() {
            return match self.index.by_id(parent_id) {
                Some(parent) => Placement::Attach(parent, LinkKind::Explicit),
                None => {
                    trace!(id = %record.id, parent_id, "explicit parent not found");
                    Placement::Orphan(OrphanReason::MissingParent)
                }
            };
        }

        if record.is_self_signed() {
            return Placement::Root;
        }

        match self.index.by_subject(&record.issuer_name) {
            Some(parent) => Placement::Attach(parent, LinkKind::Inferred),
            None => Placement::Orphan(OrphanReason::NoIssuerMatch),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Slots whose candidate edge would close a parent cycle when edges are
/// accepted in input order.
///
/// Each slot has at most one candidate parent, so cycles are disjoint and
/// each one is closed by its member that comes last in the input. A single
/// marking pass finds them all.
fn closing_edges(parents: &[Option<(usize, LinkKind)>]) -> Vec<usize> {
    let mut marks = vec![Mark::Unvisited; parents.len()];
    let mut closing = Vec::new();
    let mut path = Vec::new();

    for start in 0..parents.len() {
        path.clear();
        let mut current = Some(start);
        while let Some(slot) = current {
            match marks[slot] {
                Mark::Unvisited => {
                    marks[slot] = Mark::OnPath;
                    path.push(slot);
                    current = parents[slot].map(|(parent, _)| parent);
                }
                Mark::OnPath => {
                    let cycle_start = path.iter().position(|&s| s == slot).unwrap_or(0);
                    closing.extend(path[cycle_start..].iter().max().copied());
                    break;
                }
                Mark::Done => break,
            }
        }
        for &slot in &path {
            marks[slot] = Mark::Done;
        }
    }
    closing
}
