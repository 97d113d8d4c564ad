//! Zoom-threshold resolution.
//!
//! A shape is *collapsed* at a zoom level when its projected bounding box is
//! smaller than the configured minimum pixel size in either dimension, and
//! *expanded* otherwise. The threshold of a shape is the highest zoom at
//! which it is still collapsed: at `zoom <= threshold` its marker is shown,
//! at `zoom > threshold` its full geometry.
//!
//! The search walks outward from the map's current zoom one step at a time
//! and is bounded by the map's configured zoom limits; a shape that never
//! transitions inside those limits resolves to the limit itself rather than
//! looping.

use crate::geo::GeoBounds;
use crate::map::MapState;

/// Whether a shape's projected bounding box is below the minimum pixel size
/// at the given zoom.
///
/// A dimension exactly equal to `min_size` counts as expanded; the
/// comparison is strictly `<` in both dimensions.
pub fn collapsed<M: MapState>(map: &M, bounds: &GeoBounds, zoom: u8, min_size: f64) -> bool {
    let ne = map.project(bounds.north_east, zoom);
    let sw = map.project(bounds.south_west, zoom);

    let width = ne.x - sw.x;
    let height = sw.y - ne.y;
    width < min_size || height < min_size
}

/// Compute the zoom threshold for a shape.
///
/// Starting from the current zoom: if the shape is collapsed, zoom in until
/// it first expands and return the step before; if it is expanded, zoom out
/// until it first collapses and return that step. Reaching the map's
/// min/max zoom without a transition saturates to that bound.
pub fn zoom_threshold<M: MapState>(map: &M, bounds: &GeoBounds, min_size: f64) -> u8 {
    let mut zoom = map.zoom();

    if collapsed(map, bounds, zoom, min_size) {
        while zoom < map.max_zoom() {
            if !collapsed(map, bounds, zoom + 1, min_size) {
                return zoom;
            }
            zoom += 1;
        }
        map.max_zoom()
    } else {
        while zoom > map.min_zoom() {
            zoom -= 1;
            if collapsed(map, bounds, zoom, min_size) {
                return zoom;
            }
        }
        map.min_zoom()
    }
}
