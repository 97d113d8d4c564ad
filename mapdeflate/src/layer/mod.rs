//! Layer handles and the layer side-table.
//!
//! Shapes, point markers and groups are owned by a [`LayerStore`] and
//! addressed by stable [`LayerId`] handles. All deflate metadata lives in
//! side tables keyed by those handles; the store never tags host geometry
//! with plugin fields.
//!
//! Composite layers are a tagged variant ([`LayerKind`]) resolved by pattern
//! matching at add/remove time. Group members back-reference their containing
//! groups so interactive bindings can be inherited when a substitute marker
//! is built (see [`bindings`]).

pub mod bindings;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LayerError;
use crate::geo::{GeoBounds, LatLng};

use bindings::{Bindings, LayerEvent, Listener};

/// Stable handle to a layer in a [`LayerStore`].
///
/// Ids are issued sequentially and never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(u64);

impl LayerId {
    pub(crate) const fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The geometry role of a layer.
#[derive(Debug, Clone)]
pub enum LayerKind {
    /// A vector shape (polygon, line) with a geographic bounding box.
    Shape {
        /// Bounding box of the shape's geometry.
        bounds: GeoBounds,
    },
    /// A point layer with no bounding box; never tracked for deflation.
    Point {
        /// Position of the point.
        position: LatLng,
    },
    /// A composite group of other layers.
    Group {
        /// Member layer ids, in insertion order.
        members: Vec<LayerId>,
    },
}

/// One layer entry in the store.
#[derive(Debug)]
pub(crate) struct LayerData {
    pub(crate) kind: LayerKind,
    pub(crate) bindings: Bindings,
    /// Groups this layer is a member of.
    pub(crate) parents: Vec<LayerId>,
    /// Whether the layer is itself directly attached to the map.
    pub(crate) attached: bool,
}

/// Arena of layers addressed by [`LayerId`].
///
/// Hosts build their layer graph here (shapes, points, groups and their
/// interactive bindings) before handing ids to
/// [`crate::deflate::DeflateLayer::add_layer`].
#[derive(Debug, Default)]
pub struct LayerStore {
    layers: HashMap<LayerId, LayerData>,
    next_id: u64,
}

impl LayerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, kind: LayerKind) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.layers.insert(
            id,
            LayerData {
                kind,
                bindings: Bindings::default(),
                parents: Vec::new(),
                attached: false,
            },
        );
        id
    }

    /// Add a shape layer with the given bounding box.
    pub fn add_shape(&mut self, bounds: GeoBounds) -> LayerId {
        self.insert(LayerKind::Shape { bounds })
    }

    /// Add a point layer (no bounding box).
    pub fn add_point(&mut self, position: LatLng) -> LayerId {
        self.insert(LayerKind::Point { position })
    }

    /// Add a group layer containing the given members.
    ///
    /// Each member gains a back-reference to the new group, which the binding
    /// copier follows when building substitute markers. All members must
    /// already exist in this store.
    pub fn add_group(
        &mut self,
        members: impl IntoIterator<Item = LayerId>,
    ) -> Result<LayerId, LayerError> {
        let members: Vec<LayerId> = members.into_iter().collect();
        for &member in &members {
            if !self.layers.contains_key(&member) {
                return Err(LayerError::UnknownLayer(member));
            }
        }
        let id = self.insert(LayerKind::Group {
            members: members.clone(),
        });
        for member in members {
            if let Some(data) = self.layers.get_mut(&member) {
                data.parents.push(id);
            }
        }
        Ok(id)
    }

    pub(crate) fn get(&self, id: LayerId) -> Result<&LayerData, LayerError> {
        self.layers.get(&id).ok_or(LayerError::UnknownLayer(id))
    }

    pub(crate) fn get_mut(&mut self, id: LayerId) -> Result<&mut LayerData, LayerError> {
        self.layers.get_mut(&id).ok_or(LayerError::UnknownLayer(id))
    }

    /// Whether the store contains the given id.
    pub fn contains(&self, id: LayerId) -> bool {
        self.layers.contains_key(&id)
    }

    /// Number of layers in the store.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The geometry role of a layer.
    pub fn kind(&self, id: LayerId) -> Result<&LayerKind, LayerError> {
        Ok(&self.get(id)?.kind)
    }

    /// Bounding box of a layer, if it has one.
    ///
    /// Only shape layers carry a bounding box; points and groups return
    /// `None` (groups are decomposed before this question is asked).
    pub fn shape_bounds(&self, id: LayerId) -> Result<Option<GeoBounds>, LayerError> {
        Ok(match self.get(id)?.kind {
            LayerKind::Shape { bounds } => Some(bounds),
            _ => None,
        })
    }

    /// Bind popup content to a layer, replacing any existing popup.
    pub fn bind_popup(
        &mut self,
        id: LayerId,
        content: impl Into<String>,
    ) -> Result<(), LayerError> {
        self.get_mut(id)?.bindings.bind_popup(content);
        Ok(())
    }

    /// Bind tooltip content to a layer, replacing any existing tooltip.
    pub fn bind_tooltip(
        &mut self,
        id: LayerId,
        content: impl Into<String>,
    ) -> Result<(), LayerError> {
        self.get_mut(id)?.bindings.bind_tooltip(content);
        Ok(())
    }

    /// Popup content bound to a layer, if any.
    pub fn popup(&self, id: LayerId) -> Result<Option<&str>, LayerError> {
        Ok(self.get(id)?.bindings.popup())
    }

    /// Tooltip content bound to a layer, if any.
    pub fn tooltip(&self, id: LayerId) -> Result<Option<&str>, LayerError> {
        Ok(self.get(id)?.bindings.tooltip())
    }

    /// Register an event listener on a layer.
    ///
    /// Listeners for the same event are kept in registration order.
    pub fn on(
        &mut self,
        id: LayerId,
        event: impl Into<String>,
        listener: Listener,
    ) -> Result<(), LayerError> {
        self.get_mut(id)?.bindings.on(event, listener);
        Ok(())
    }

    /// Dispatch an event to the layer's listeners.
    pub fn fire(&self, id: LayerId, event: &str) -> Result<(), LayerError> {
        let data = self.get(id)?;
        data.bindings.fire(&LayerEvent {
            target: id,
            name: event.to_string(),
        });
        Ok(())
    }

    /// Mark a layer as directly attached to (or detached from) the map.
    ///
    /// Groups that are independently live on the map are skipped when
    /// inherited bindings are copied onto substitute markers.
    pub fn set_attached(&mut self, id: LayerId, attached: bool) -> Result<(), LayerError> {
        self.get_mut(id)?.attached = attached;
        Ok(())
    }

    /// Whether a layer is directly attached to the map.
    pub fn is_attached(&self, id: LayerId) -> Result<bool, LayerError> {
        Ok(self.get(id)?.attached)
    }
}
