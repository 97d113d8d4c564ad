//! The visible-representation container.
//!
//! `AggregateGroup` models the single composite layer actually attached to
//! the map: for every managed shape it holds either the shape's full
//! geometry or its substitute marker, never both. Membership is a set, so
//! inserts and removes are idempotent by construction.

use std::collections::HashSet;

use crate::layer::LayerId;

/// One representation of a managed layer inside the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// The layer's own geometry (or the layer itself for untracked layers).
    Geometry(LayerId),
    /// The substitute marker standing in for the shape with this id.
    Marker(LayerId),
}

/// The composed collection of currently visible representations.
#[derive(Debug, Default)]
pub struct AggregateGroup {
    clustered: bool,
    members: HashSet<Representation>,
}

impl AggregateGroup {
    /// Create an empty aggregate.
    ///
    /// `clustered` records whether the hosting container clusters markers;
    /// the clustering subsystem itself is external to this crate.
    pub fn new(clustered: bool) -> Self {
        Self {
            clustered,
            members: HashSet::new(),
        }
    }

    /// Whether the aggregate container clusters markers.
    pub fn is_clustered(&self) -> bool {
        self.clustered
    }

    /// Insert a representation. Re-inserting an existing member is a no-op.
    pub fn insert(&mut self, representation: Representation) -> bool {
        self.members.insert(representation)
    }

    /// Remove a representation. Removing an absent member is a no-op.
    pub fn remove(&mut self, representation: &Representation) -> bool {
        self.members.remove(representation)
    }

    /// Whether a representation is currently present.
    pub fn contains(&self, representation: &Representation) -> bool {
        self.members.contains(representation)
    }

    /// Number of visible representations.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the aggregate holds nothing.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate over the visible representations (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &Representation> {
        self.members.iter()
    }
}
