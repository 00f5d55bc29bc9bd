//! Domain layer: CA records, hierarchy resolution and display transforms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod filter;
pub mod flatten;
pub mod index;
pub mod paginate;
pub mod resolver;
pub mod sort;
pub mod tree;

pub use arena::{ArenaNode, HierarchyArena};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use filter::{filter_forest, filter_records, FilterField, TextQuery};
pub use flatten::{flatten, FlatRow};
pub use index::{RecordIndex, SkipReason, SkippedRecord};
pub use paginate::{paginate, Page};
pub use resolver::{resolve, resolve_records, HierarchyResolver, OrphanReason, Resolution};
pub use sort::{sort_forest, sort_records, SortDirection, SortKey};
pub use tree::{fold_forest, iter_forest, serialize_forest, ExpandedSet, Forest, LinkKind, TreeNode};
