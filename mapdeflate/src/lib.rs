//! MapDeflate - zoom-aware collapsing of small vector shapes into markers
//!
//! Interactive maps become illegible when polygons and lines shrink below a
//! few pixels at low zoom. This crate decides, per shape and per zoom level,
//! whether to show the full geometry or a substitute point marker, and keeps
//! that decision current as the viewport changes - without losing the
//! shape's click handlers, popups or tooltips.
//!
//! # Architecture
//!
//! ```text
//! host map ──MapState──► threshold ──► DeflateLayer ◄──ViewportEvent── host
//!                        (per shape)   (registry + sync)
//!                                        │
//!                                        ▼
//!                                   AggregateGroup
//!                                   (one representation per shape)
//! ```
//!
//! The crate never projects coordinates itself: everything it needs from the
//! host map engine goes through the [`map::MapState`] trait.
//! [`mercator::MercatorMap`] is a ready-made implementation for the common
//! Web Mercator case.
//!
//! # Example
//!
//! ```
//! use mapdeflate::deflate::{DeflateLayer, DeflateOptions};
//! use mapdeflate::geo::{GeoBounds, LatLng};
//! use mapdeflate::map::ViewportEvent;
//! use mapdeflate::mercator::MercatorMap;
//!
//! let mut map = MercatorMap::new(
//!     6,
//!     GeoBounds::new(LatLng::new(47.0, 5.0), LatLng::new(55.0, 15.0)),
//! );
//! let mut deflate = DeflateLayer::new(DeflateOptions::new().with_min_size(10.0));
//!
//! // A city block: tiny at zoom 6, so it enters as a marker.
//! let block = deflate.store_mut().add_shape(GeoBounds::new(
//!     LatLng::new(53.550, 9.990),
//!     LatLng::new(53.552, 9.994),
//! ));
//! deflate.store_mut().bind_popup(block, "Rathausmarkt").unwrap();
//! deflate.add_layer(block, &map).unwrap();
//! deflate.on_add(&map);
//!
//! // The marker carries the popup.
//! assert_eq!(deflate.marker(block).unwrap().bindings().popup(), Some("Rathausmarkt"));
//!
//! // Zooming in far enough swaps the marker for the full geometry.
//! map.set_zoom(18);
//! deflate.handle_event(ViewportEvent::ZoomEnd, &map);
//! # assert!(deflate.bounds().is_some());
//! ```

pub mod aggregate;
pub mod deflate;
pub mod error;
pub mod geo;
pub mod layer;
pub mod map;
pub mod mercator;
pub mod threshold;

pub use deflate::{DeflateLayer, DeflateOptions, DisplayState, Marker, MarkerOptions};
pub use error::LayerError;
pub use geo::{GeoBounds, LatLng, PixelPoint};
pub use layer::{LayerId, LayerStore};
pub use map::{MapState, ViewportEvent};
