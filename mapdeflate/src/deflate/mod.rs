//! The deflate layer: registry and viewport synchronization.
//!
//! `DeflateLayer` tracks every managed shape together with its zoom
//! threshold and substitute marker, and keeps exactly one representation of
//! each shape inside the aggregate container as the viewport changes.
//!
//! # State machine per shape
//!
//! ```text
//! Collapsed --[zoom rises above threshold, shape in viewport]--> Expanded
//! Expanded --[zoom falls to threshold or below, shape in viewport]--> Collapsed
//! ```
//!
//! Shapes outside the viewport are skipped during synchronization and stay
//! stale until they next intersect the view; correctness is restored lazily
//! on re-entry.
//!
//! # Example
//!
//! ```
//! use mapdeflate::deflate::{DeflateLayer, DeflateOptions};
//! use mapdeflate::geo::{GeoBounds, LatLng};
//! use mapdeflate::mercator::MercatorMap;
//!
//! let map = MercatorMap::new(
//!     10,
//!     GeoBounds::new(LatLng::new(51.0, -1.0), LatLng::new(52.0, 1.0)),
//! );
//! let mut deflate = DeflateLayer::new(DeflateOptions::default());
//!
//! let shape = deflate.store_mut().add_shape(GeoBounds::new(
//!     LatLng::new(51.500, -0.100),
//!     LatLng::new(51.505, -0.095),
//! ));
//! deflate.add_layer(shape, &map).unwrap();
//! deflate.on_add(&map);
//! ```

mod options;

pub use options::{DeflateOptions, MarkerOptions, MarkerSource, DEFAULT_MIN_SIZE};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::aggregate::{AggregateGroup, Representation};
use crate::error::LayerError;
use crate::geo::{GeoBounds, LatLng};
use crate::layer::bindings::{self, Bindings, LayerEvent};
use crate::layer::{LayerId, LayerKind, LayerStore};
use crate::map::{MapState, ViewportEvent};
use crate::threshold;

/// Which representation of a shape is currently visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayState {
    /// The substitute marker is shown.
    Collapsed,
    /// The full geometry is shown.
    Expanded,
}

/// A substitute point marker standing in for a collapsed shape.
///
/// Created once when its shape is added, positioned at the center of the
/// shape's bounding box, and carrying a copy of the shape's (and its
/// groups') interactive bindings.
#[derive(Debug)]
pub struct Marker {
    source: LayerId,
    position: LatLng,
    options: MarkerOptions,
    bindings: Bindings,
}

impl Marker {
    /// The shape this marker stands in for.
    pub fn source(&self) -> LayerId {
        self.source
    }

    /// Marker position (center of the source shape's bounds).
    pub fn position(&self) -> LatLng {
        self.position
    }

    /// Resolved marker options.
    pub fn options(&self) -> &MarkerOptions {
        &self.options
    }

    /// The marker's copied bindings.
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Dispatch an event to the marker's listeners.
    pub fn fire(&self, event: &str) {
        self.bindings.fire(&LayerEvent {
            target: self.source,
            name: event.to_string(),
        });
    }
}

/// Deflate metadata for one managed shape.
///
/// Threshold and marker are computed once at add time and never change;
/// `zoom_state` and `display` are updated on every viewport change that
/// reaches the shape.
#[derive(Debug)]
struct ManagedShape {
    layer: LayerId,
    bounds: GeoBounds,
    marker: Marker,
    zoom_threshold: u8,
    zoom_state: u8,
    display: DisplayState,
}

/// The deflate layer.
///
/// Owns the [`LayerStore`] hosts build their layers in, the set of managed
/// shapes with their thresholds and markers, and the aggregate container of
/// currently visible representations.
#[derive(Debug)]
pub struct DeflateLayer {
    options: DeflateOptions,
    store: LayerStore,
    managed: Vec<ManagedShape>,
    aggregate: AggregateGroup,
    active: bool,
}

impl DeflateLayer {
    /// Create a deflate layer with the given options.
    pub fn new(options: DeflateOptions) -> Self {
        let aggregate = AggregateGroup::new(options.marker_cluster);
        Self {
            options,
            store: LayerStore::new(),
            managed: Vec::new(),
            aggregate,
            active: false,
        }
    }

    /// The layer store, for building shapes, points, groups and bindings.
    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    /// Mutable access to the layer store.
    pub fn store_mut(&mut self) -> &mut LayerStore {
        &mut self.store
    }

    /// The aggregate container of currently visible representations.
    pub fn aggregate(&self) -> &AggregateGroup {
        &self.aggregate
    }

    /// Whether the given shape is tracked for threshold switching.
    pub fn is_managed(&self, id: LayerId) -> bool {
        self.managed.iter().any(|shape| shape.layer == id)
    }

    /// Zoom threshold of a managed shape.
    pub fn zoom_threshold(&self, id: LayerId) -> Option<u8> {
        self.managed
            .iter()
            .find(|shape| shape.layer == id)
            .map(|shape| shape.zoom_threshold)
    }

    /// Current display state of a managed shape.
    pub fn display_state(&self, id: LayerId) -> Option<DisplayState> {
        self.managed
            .iter()
            .find(|shape| shape.layer == id)
            .map(|shape| shape.display)
    }

    /// The substitute marker of a managed shape.
    pub fn marker(&self, id: LayerId) -> Option<&Marker> {
        self.managed
            .iter()
            .find(|shape| shape.layer == id)
            .map(|shape| &shape.marker)
    }

    /// Add a layer to the deflate layer.
    ///
    /// Groups are decomposed recursively. Shapes get a zoom threshold and a
    /// substitute marker computed once, then enter the aggregate with the
    /// representation matching the current zoom. Point layers (no bounding
    /// box) are added to the aggregate unchanged and are never tracked.
    /// Adding an already-managed shape is a no-op.
    pub fn add_layer<M: MapState>(&mut self, id: LayerId, map: &M) -> Result<(), LayerError> {
        match self.store.kind(id)?.clone() {
            LayerKind::Group { members } => {
                for member in members {
                    self.add_layer(member, map)?;
                }
                Ok(())
            }
            LayerKind::Point { .. } => {
                self.aggregate.insert(Representation::Geometry(id));
                Ok(())
            }
            LayerKind::Shape { bounds } => {
                if self.is_managed(id) {
                    trace!(layer = %id, "already managed, ignoring re-add");
                    return Ok(());
                }

                let zoom = map.zoom();
                let zoom_threshold =
                    threshold::zoom_threshold(map, &bounds, self.options.min_size);
                let marker = self.make_marker(id, &bounds)?;

                // Named `display_state` rather than `display`: the tracing
                // macros import `tracing::field::display` into their
                // expansion scope, which shadows a local named `display`.
                let display_state = if zoom <= zoom_threshold {
                    DisplayState::Collapsed
                } else {
                    DisplayState::Expanded
                };
                self.aggregate.insert(match display_state {
                    DisplayState::Collapsed => Representation::Marker(id),
                    DisplayState::Expanded => Representation::Geometry(id),
                });

                debug!(
                    layer = %id,
                    zoom_threshold,
                    zoom,
                    display = ?display_state,
                    "shape added to deflate layer"
                );
                self.managed.push(ManagedShape {
                    layer: id,
                    bounds,
                    marker,
                    zoom_threshold,
                    zoom_state: zoom,
                    display: display_state,
                });
                Ok(())
            }
        }
    }

    /// Remove a layer from the deflate layer.
    ///
    /// Groups are decomposed recursively. Both representations of the layer
    /// are removed from the aggregate (removing an absent one is a no-op)
    /// and its deflate metadata is dropped. Removing a layer that was never
    /// added is tolerated.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<(), LayerError> {
        match self.store.kind(id)?.clone() {
            LayerKind::Group { members } => {
                for member in members {
                    self.remove_layer(member)?;
                }
                Ok(())
            }
            _ => {
                self.aggregate.remove(&Representation::Marker(id));
                self.aggregate.remove(&Representation::Geometry(id));
                if let Some(index) = self.managed.iter().position(|shape| shape.layer == id) {
                    self.managed.remove(index);
                    debug!(layer = %id, "shape removed from deflate layer");
                }
                Ok(())
            }
        }
    }

    /// Combined bounding box of everything currently visible.
    pub fn bounds(&self) -> Option<GeoBounds> {
        let mut combined: Option<GeoBounds> = None;
        for representation in self.aggregate.iter() {
            let bounds = match *representation {
                Representation::Geometry(id) => match self.store.kind(id) {
                    Ok(LayerKind::Shape { bounds }) => *bounds,
                    Ok(LayerKind::Point { position }) => GeoBounds::from_point(*position),
                    _ => continue,
                },
                Representation::Marker(id) => match self.marker(id) {
                    Some(marker) => GeoBounds::from_point(marker.position()),
                    None => continue,
                },
            };
            combined = Some(match combined {
                Some(acc) => acc.extended(&bounds),
                None => bounds,
            });
        }
        combined
    }

    /// Activate the layer on attach and run one synchronization pass.
    pub fn on_add<M: MapState>(&mut self, map: &M) {
        self.active = true;
        debug!("deflate layer attached");
        self.sync_viewport(map);
    }

    /// Deactivate the layer on detach; viewport events are ignored until the
    /// next [`on_add`](Self::on_add).
    pub fn on_remove(&mut self) {
        self.active = false;
        debug!("deflate layer detached");
    }

    /// Handle a viewport settlement notification from the host.
    ///
    /// Ignored while the layer is not attached. Both zoom-end and move-end
    /// trigger the same re-evaluation.
    pub fn handle_event<M: MapState>(&mut self, event: ViewportEvent, map: &M) {
        if !self.active {
            trace!(?event, "viewport event ignored while detached");
            return;
        }
        trace!(?event, "viewport event");
        self.sync_viewport(map);
    }

    /// Re-evaluate every managed shape against the current viewport.
    ///
    /// Shapes whose recorded zoom differs from the current zoom and whose
    /// bounds intersect the viewport swap representation as needed; shapes
    /// outside the viewport are skipped and stay stale until they re-enter.
    pub fn sync_viewport<M: MapState>(&mut self, map: &M) {
        let zoom = map.zoom();
        let view = map.bounds();

        for shape in &mut self.managed {
            if shape.zoom_state == zoom {
                continue;
            }
            if !shape.bounds.intersects(&view) {
                // Stale by design; re-evaluated when it next enters the view.
                continue;
            }

            // See `add_layer` for why this is not named `display`.
            let display_state = if zoom <= shape.zoom_threshold {
                DisplayState::Collapsed
            } else {
                DisplayState::Expanded
            };
            let (show, hide) = match display_state {
                DisplayState::Collapsed => (
                    Representation::Marker(shape.layer),
                    Representation::Geometry(shape.layer),
                ),
                DisplayState::Expanded => (
                    Representation::Geometry(shape.layer),
                    Representation::Marker(shape.layer),
                ),
            };
            self.aggregate.insert(show);
            self.aggregate.remove(&hide);

            if shape.display != display_state {
                trace!(
                    layer = %shape.layer,
                    zoom,
                    zoom_threshold = shape.zoom_threshold,
                    display = ?display_state,
                    "representation switched"
                );
            }
            shape.zoom_state = zoom;
            shape.display = display_state;
        }
    }

    fn make_marker(&mut self, id: LayerId, bounds: &GeoBounds) -> Result<Marker, LayerError> {
        let options = self.options.marker_source.resolve(id, bounds);
        let mut marker = Marker {
            source: id,
            position: bounds.center(),
            options,
            bindings: Bindings::default(),
        };
        bindings::copy_into(&mut self.store, id, &mut marker.bindings)?;
        Ok(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::PixelPoint;
    use std::cell::Cell;

    /// Linear test projection with a call counter: one degree maps to
    /// `2^zoom` pixels.
    struct TestMap {
        zoom: u8,
        min_zoom: u8,
        max_zoom: u8,
        view: GeoBounds,
        project_calls: Cell<usize>,
    }

    impl TestMap {
        fn new(zoom: u8, view: GeoBounds) -> Self {
            Self {
                zoom,
                min_zoom: 0,
                max_zoom: 18,
                view,
                project_calls: Cell::new(0),
            }
        }
    }

    impl MapState for TestMap {
        fn zoom(&self) -> u8 {
            self.zoom
        }
        fn min_zoom(&self) -> u8 {
            self.min_zoom
        }
        fn max_zoom(&self) -> u8 {
            self.max_zoom
        }
        fn bounds(&self) -> GeoBounds {
            self.view
        }
        fn project(&self, position: LatLng, zoom: u8) -> PixelPoint {
            self.project_calls.set(self.project_calls.get() + 1);
            let scale = 2.0_f64.powi(zoom as i32);
            PixelPoint::new(position.lng * scale, -position.lat * scale)
        }
    }

    fn world() -> GeoBounds {
        GeoBounds::new(LatLng::new(-90.0, -180.0), LatLng::new(90.0, 180.0))
    }

    /// 0.625 degrees: exactly 10px at zoom 4 under the linear projection,
    /// so the threshold is 3 everywhere in these tests.
    fn small_square() -> GeoBounds {
        GeoBounds::new(LatLng::new(0.0, 0.0), LatLng::new(0.625, 0.625))
    }

    mod registry {
        use super::*;

        #[test]
        fn test_collapsed_shape_enters_as_marker() {
            let map = TestMap::new(2, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let shape = deflate.store_mut().add_shape(small_square());

            deflate.add_layer(shape, &map).unwrap();

            assert_eq!(deflate.zoom_threshold(shape), Some(3));
            assert_eq!(deflate.display_state(shape), Some(DisplayState::Collapsed));
            assert!(deflate.aggregate().contains(&Representation::Marker(shape)));
            assert!(!deflate.aggregate().contains(&Representation::Geometry(shape)));
        }

        #[test]
        fn test_expanded_shape_enters_as_geometry() {
            let map = TestMap::new(8, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let shape = deflate.store_mut().add_shape(small_square());

            deflate.add_layer(shape, &map).unwrap();

            assert_eq!(deflate.display_state(shape), Some(DisplayState::Expanded));
            assert!(deflate.aggregate().contains(&Representation::Geometry(shape)));
            assert!(!deflate.aggregate().contains(&Representation::Marker(shape)));
        }

        #[test]
        fn test_double_add_is_noop() {
            let map = TestMap::new(2, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let shape = deflate.store_mut().add_shape(small_square());

            deflate.add_layer(shape, &map).unwrap();
            let calls_after_first = map.project_calls.get();
            deflate.add_layer(shape, &map).unwrap();

            // No recomputation and no second representation.
            assert_eq!(map.project_calls.get(), calls_after_first);
            assert_eq!(deflate.aggregate().len(), 1);
        }

        #[test]
        fn test_point_layer_added_unchanged_and_untracked() {
            let map = TestMap::new(2, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let point = deflate.store_mut().add_point(LatLng::new(5.0, 5.0));

            deflate.add_layer(point, &map).unwrap();

            assert!(!deflate.is_managed(point));
            assert!(deflate.aggregate().contains(&Representation::Geometry(point)));
            // No projection was ever needed for a point layer.
            assert_eq!(map.project_calls.get(), 0);
        }

        #[test]
        fn test_group_is_decomposed_recursively() {
            let map = TestMap::new(2, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let a = deflate.store_mut().add_shape(small_square());
            let b = deflate.store_mut().add_shape(small_square());
            let point = deflate.store_mut().add_point(LatLng::new(5.0, 5.0));
            let inner = deflate.store_mut().add_group([b, point]).unwrap();
            let outer = deflate.store_mut().add_group([a, inner]).unwrap();

            deflate.add_layer(outer, &map).unwrap();

            assert!(deflate.is_managed(a));
            assert!(deflate.is_managed(b));
            assert!(!deflate.is_managed(point));
            assert_eq!(deflate.aggregate().len(), 3);
        }

        #[test]
        fn test_remove_layer_round_trip() {
            let map = TestMap::new(2, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let shape = deflate.store_mut().add_shape(small_square());

            deflate.add_layer(shape, &map).unwrap();
            deflate.remove_layer(shape).unwrap();

            assert!(deflate.aggregate().is_empty());
            assert!(!deflate.is_managed(shape));
            assert_eq!(deflate.zoom_threshold(shape), None);

            // Removing again is tolerated.
            deflate.remove_layer(shape).unwrap();
            assert!(deflate.aggregate().is_empty());
        }

        #[test]
        fn test_remove_never_added_layer_is_noop() {
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let shape = deflate.store_mut().add_shape(small_square());
            deflate.remove_layer(shape).unwrap();
            assert!(deflate.aggregate().is_empty());
        }

        #[test]
        fn test_unknown_layer_is_typed_error() {
            let map = TestMap::new(2, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let mut other = LayerStore::new();
            let foreign = other.add_shape(small_square());

            assert!(matches!(
                deflate.add_layer(foreign, &map),
                Err(LayerError::UnknownLayer(_))
            ));
            assert!(matches!(
                deflate.remove_layer(foreign),
                Err(LayerError::UnknownLayer(_))
            ));
        }

        #[test]
        fn test_marker_position_is_bounds_center() {
            let map = TestMap::new(2, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let shape = deflate.store_mut().add_shape(small_square());

            deflate.add_layer(shape, &map).unwrap();
            let marker = deflate.marker(shape).unwrap();
            assert_eq!(marker.position(), small_square().center());
            assert_eq!(marker.source(), shape);
        }

        #[test]
        fn test_per_shape_marker_options() {
            let map = TestMap::new(2, world());
            let mut deflate = DeflateLayer::new(
                DeflateOptions::new().with_marker_options_fn(|id, _| {
                    MarkerOptions::default().with_title(format!("shape {}", id))
                }),
            );
            let shape = deflate.store_mut().add_shape(small_square());

            deflate.add_layer(shape, &map).unwrap();
            let marker = deflate.marker(shape).unwrap();
            assert_eq!(
                marker.options().title.as_deref(),
                Some(format!("shape {}", shape).as_str())
            );
        }

        #[test]
        fn test_bounds_combines_geometries_and_markers() {
            let map = TestMap::new(8, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            // Expanded at zoom 8: contributes its full bounds.
            let big = deflate
                .store_mut()
                .add_shape(GeoBounds::new(LatLng::new(10.0, 10.0), LatLng::new(20.0, 20.0)));
            // Point layer far away.
            let point = deflate.store_mut().add_point(LatLng::new(-30.0, -30.0));

            deflate.add_layer(big, &map).unwrap();
            deflate.add_layer(point, &map).unwrap();

            let bounds = deflate.bounds().unwrap();
            assert_eq!(bounds.south_west, LatLng::new(-30.0, -30.0));
            assert_eq!(bounds.north_east, LatLng::new(20.0, 20.0));
        }

        #[test]
        fn test_bounds_empty_when_nothing_added() {
            let deflate = DeflateLayer::new(DeflateOptions::default());
            assert_eq!(deflate.bounds(), None);
        }
    }

    mod sync {
        use super::*;

        fn exactly_one_representation(deflate: &DeflateLayer, shape: LayerId) -> bool {
            deflate.aggregate().contains(&Representation::Marker(shape))
                != deflate.aggregate().contains(&Representation::Geometry(shape))
        }

        #[test]
        fn test_zoom_crossing_switches_representation() {
            let mut map = TestMap::new(2, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let shape = deflate.store_mut().add_shape(small_square());
            deflate.add_layer(shape, &map).unwrap();
            deflate.on_add(&map);
            assert_eq!(deflate.display_state(shape), Some(DisplayState::Collapsed));

            // Cross above the threshold (3): geometry appears.
            map.zoom = 4;
            deflate.handle_event(ViewportEvent::ZoomEnd, &map);
            assert_eq!(deflate.display_state(shape), Some(DisplayState::Expanded));
            assert!(exactly_one_representation(&deflate, shape));

            // Back at the threshold: marker again.
            map.zoom = 3;
            deflate.handle_event(ViewportEvent::ZoomEnd, &map);
            assert_eq!(deflate.display_state(shape), Some(DisplayState::Collapsed));
            assert!(exactly_one_representation(&deflate, shape));
        }

        #[test]
        fn test_out_of_viewport_shape_stays_stale() {
            let mut map = TestMap::new(2, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let shape = deflate.store_mut().add_shape(small_square());
            deflate.add_layer(shape, &map).unwrap();
            deflate.on_add(&map);

            // Pan away, then zoom past the threshold: the shape is not
            // re-evaluated.
            map.view = GeoBounds::new(LatLng::new(40.0, 40.0), LatLng::new(50.0, 50.0));
            map.zoom = 8;
            deflate.handle_event(ViewportEvent::ZoomEnd, &map);
            assert_eq!(deflate.display_state(shape), Some(DisplayState::Collapsed));
            assert!(deflate.aggregate().contains(&Representation::Marker(shape)));

            // Pan back: correctness restored lazily.
            map.view = world();
            deflate.handle_event(ViewportEvent::MoveEnd, &map);
            assert_eq!(deflate.display_state(shape), Some(DisplayState::Expanded));
            assert!(exactly_one_representation(&deflate, shape));
        }

        #[test]
        fn test_no_switch_when_zoom_unchanged() {
            let map = TestMap::new(2, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let shape = deflate.store_mut().add_shape(small_square());
            deflate.add_layer(shape, &map).unwrap();
            deflate.on_add(&map);

            let calls = map.project_calls.get();
            // Same zoom: move-end does not re-project or switch anything.
            deflate.handle_event(ViewportEvent::MoveEnd, &map);
            assert_eq!(map.project_calls.get(), calls);
            assert_eq!(deflate.display_state(shape), Some(DisplayState::Collapsed));
        }

        #[test]
        fn test_events_ignored_while_detached() {
            let mut map = TestMap::new(2, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let shape = deflate.store_mut().add_shape(small_square());
            deflate.add_layer(shape, &map).unwrap();

            // Never attached: zoom events do nothing.
            map.zoom = 8;
            deflate.handle_event(ViewportEvent::ZoomEnd, &map);
            assert_eq!(deflate.display_state(shape), Some(DisplayState::Collapsed));

            // Attach runs a sync; detach stops handling again.
            deflate.on_add(&map);
            assert_eq!(deflate.display_state(shape), Some(DisplayState::Expanded));
            deflate.on_remove();
            map.zoom = 2;
            deflate.handle_event(ViewportEvent::ZoomEnd, &map);
            assert_eq!(deflate.display_state(shape), Some(DisplayState::Expanded));
        }

        #[test]
        fn test_invariant_holds_across_many_transitions() {
            let mut map = TestMap::new(0, world());
            let mut deflate = DeflateLayer::new(DeflateOptions::default());
            let shape = deflate.store_mut().add_shape(small_square());
            deflate.add_layer(shape, &map).unwrap();
            deflate.on_add(&map);

            for zoom in [1, 5, 3, 4, 0, 18, 3, 2] {
                map.zoom = zoom;
                deflate.handle_event(ViewportEvent::ZoomEnd, &map);
                assert!(
                    exactly_one_representation(&deflate, shape),
                    "invariant violated at zoom {}",
                    zoom
                );
            }
        }
    }
}
