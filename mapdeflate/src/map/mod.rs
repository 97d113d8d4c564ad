//! Host map capabilities.
//!
//! The deflate layer is an embedded component: it never projects coordinates
//! or tracks viewport state itself. Everything it needs from the hosting map
//! engine is expressed by the [`MapState`] trait, and viewport settlement is
//! delivered by the host as [`ViewportEvent`] notifications.

use crate::geo::{GeoBounds, LatLng, PixelPoint};

/// Read-only view of the hosting map's state.
///
/// Implemented by the host map engine (or by [`crate::mercator::MercatorMap`]
/// for hosts using the standard Web Mercator CRS). All deflate decisions are
/// made through this trait, keeping the core free of projection math.
pub trait MapState {
    /// Current zoom level.
    fn zoom(&self) -> u8;

    /// Lowest zoom level the map can reach.
    fn min_zoom(&self) -> u8;

    /// Highest zoom level the map can reach.
    fn max_zoom(&self) -> u8;

    /// Geographic bounds of the current viewport.
    fn bounds(&self) -> GeoBounds;

    /// Project a geographic point to pixel coordinates at the given zoom.
    fn project(&self, position: LatLng, zoom: u8) -> PixelPoint;
}

/// A viewport settlement notification from the host.
///
/// Fired by the host after a zoom or pan gesture comes to rest; both variants
/// trigger the same re-evaluation of managed shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    /// The zoom level has settled.
    ZoomEnd,
    /// The map has finished panning.
    MoveEnd,
}
