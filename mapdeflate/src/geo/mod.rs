//! Geographic and pixel-space primitives.
//!
//! Provides the latitude/longitude point, geographic bounding box and pixel
//! point types shared by the whole crate. No projection math lives here; the
//! conversion between geographic and pixel coordinates is a host capability
//! (see [`crate::map::MapState`]).

use serde::{Deserialize, Serialize};

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl LatLng {
    /// Create a new geographic point.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A point in projected pixel space at some zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Horizontal pixel coordinate, increasing east.
    pub x: f64,
    /// Vertical pixel coordinate, increasing south.
    pub y: f64,
}

impl PixelPoint {
    /// Create a new pixel point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A geographic bounding box spanning from a southwest to a northeast corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    /// Southwest corner (minimum latitude and longitude).
    pub south_west: LatLng,
    /// Northeast corner (maximum latitude and longitude).
    pub north_east: LatLng,
}

impl GeoBounds {
    /// Create a bounding box from two corner points.
    ///
    /// The corners may be given in any order; they are normalized so that
    /// `south_west` holds the minima and `north_east` the maxima.
    pub fn new(a: LatLng, b: LatLng) -> Self {
        Self {
            south_west: LatLng::new(a.lat.min(b.lat), a.lng.min(b.lng)),
            north_east: LatLng::new(a.lat.max(b.lat), a.lng.max(b.lng)),
        }
    }

    /// Create a degenerate bounding box containing a single point.
    pub fn from_point(point: LatLng) -> Self {
        Self {
            south_west: point,
            north_east: point,
        }
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    /// Width of the bounds in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.north_east.lng - self.south_west.lng
    }

    /// Height of the bounds in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.north_east.lat - self.south_west.lat
    }

    /// Whether this bounding box overlaps another.
    ///
    /// Boxes that merely touch along an edge or corner count as intersecting.
    pub fn intersects(&self, other: &GeoBounds) -> bool {
        self.south_west.lat <= other.north_east.lat
            && self.north_east.lat >= other.south_west.lat
            && self.south_west.lng <= other.north_east.lng
            && self.north_east.lng >= other.south_west.lng
    }

    /// Return the smallest bounding box containing both `self` and `other`.
    pub fn extended(&self, other: &GeoBounds) -> GeoBounds {
        GeoBounds {
            south_west: LatLng::new(
                self.south_west.lat.min(other.south_west.lat),
                self.south_west.lng.min(other.south_west.lng),
            ),
            north_east: LatLng::new(
                self.north_east.lat.max(other.north_east.lat),
                self.north_east.lng.max(other.north_east.lng),
            ),
        }
    }
}
