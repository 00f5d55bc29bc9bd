//! Application services

pub mod hierarchy;

pub use hierarchy::{ForestRow, HierarchyService, HierarchyView, OrphanRow, ViewQuery};
