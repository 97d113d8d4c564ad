//! Reference [`MapState`] implementation over spherical Web Mercator.
//!
//! Most interactive web maps use the EPSG:3857 projection with 256px tiles,
//! so this implementation covers the common case and backs the crate's own
//! tests. Hosts with a different CRS implement [`MapState`] themselves; the
//! deflate core only ever talks to the trait.

use std::f64::consts::PI;

use crate::geo::{GeoBounds, LatLng, PixelPoint};
use crate::map::MapState;

/// Lowest zoom level supported by default.
pub const MIN_ZOOM: u8 = 0;

/// Highest zoom level supported by default.
pub const MAX_ZOOM: u8 = 18;

/// Latitude magnitude beyond which Web Mercator is undefined.
pub const MAX_LAT: f64 = 85.051_128_78;

/// Pixel width of the world at zoom 0.
const TILE_SIZE: f64 = 256.0;

/// A Web Mercator map view: zoom level, zoom limits and viewport bounds.
#[derive(Debug, Clone)]
pub struct MercatorMap {
    zoom: u8,
    min_zoom: u8,
    max_zoom: u8,
    view: GeoBounds,
}

impl MercatorMap {
    /// Create a map view at the given zoom showing the given bounds.
    ///
    /// Zoom limits default to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    pub fn new(zoom: u8, view: GeoBounds) -> Self {
        Self {
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            view,
        }
    }

    /// Set custom zoom limits, clamping the current zoom into range.
    pub fn with_zoom_limits(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
        self
    }

    /// Change the zoom level, clamped to the configured limits.
    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Move the viewport to new bounds.
    pub fn set_view(&mut self, view: GeoBounds) {
        self.view = view;
    }
}

impl MapState for MercatorMap {
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
        // World width in pixels at this zoom.
        let scale = TILE_SIZE * 2.0_f64.powi(zoom as i32);

        let lat = position.lat.clamp(-MAX_LAT, MAX_LAT);
        let sin_lat = lat.to_radians().sin();

        let x = scale * (0.5 + position.lng / 360.0);
        let y = scale * (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI));

        PixelPoint::new(x, y)
    }
}
