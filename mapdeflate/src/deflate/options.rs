//! Construction-time configuration for the deflate layer.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geo::GeoBounds;
use crate::layer::LayerId;

/// Default collapse/expand cutoff in pixels.
pub const DEFAULT_MIN_SIZE: f64 = 10.0;

/// Appearance and behavior options for substitute markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerOptions {
    /// Name of the icon to render, host-defined. `None` uses the host's
    /// default marker icon.
    pub icon: Option<String>,
    /// Accessible title / hover text.
    pub title: Option<String>,
    /// Marker opacity, 0.0 to 1.0.
    pub opacity: f64,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self {
            icon: None,
            title: None,
            opacity: 1.0,
        }
    }
}

impl MarkerOptions {
    /// Set the icon name.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

/// How marker options are resolved for a shape.
#[derive(Clone)]
pub enum MarkerSource {
    /// The same options for every marker.
    Static(MarkerOptions),
    /// Options computed per shape from its id and bounding box.
    PerShape(Rc<dyn Fn(LayerId, &GeoBounds) -> MarkerOptions>),
}

impl MarkerSource {
    /// Resolve the options for one shape.
    pub(crate) fn resolve(&self, id: LayerId, bounds: &GeoBounds) -> MarkerOptions {
        match self {
            MarkerSource::Static(options) => options.clone(),
            MarkerSource::PerShape(f) => f(id, bounds),
        }
    }
}

impl Default for MarkerSource {
    fn default() -> Self {
        MarkerSource::Static(MarkerOptions::default())
    }
}

impl fmt::Debug for MarkerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerSource::Static(options) => f.debug_tuple("Static").field(options).finish(),
            MarkerSource::PerShape(_) => f.write_str("PerShape(..)"),
        }
    }
}

/// Options for [`crate::deflate::DeflateLayer`].
#[derive(Debug, Clone)]
pub struct DeflateOptions {
    /// Minimum projected pixel size below which a shape collapses into a
    /// marker. Default 10.
    pub min_size: f64,
    /// Whether the aggregate container clusters markers. Default false.
    pub marker_cluster: bool,
    /// Marker options, static or per shape.
    pub marker_source: MarkerSource,
}

impl Default for DeflateOptions {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            marker_cluster: false,
            marker_source: MarkerSource::default(),
        }
    }
}

impl DeflateOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collapse/expand pixel cutoff.
    pub fn with_min_size(mut self, min_size: f64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Enable or disable marker clustering in the aggregate container.
    pub fn with_marker_cluster(mut self, marker_cluster: bool) -> Self {
        self.marker_cluster = marker_cluster;
        self
    }

    /// Use the same marker options for every shape.
    pub fn with_marker_options(mut self, options: MarkerOptions) -> Self {
        self.marker_source = MarkerSource::Static(options);
        self
    }

    /// Compute marker options per shape.
    pub fn with_marker_options_fn(
        mut self,
        f: impl Fn(LayerId, &GeoBounds) -> MarkerOptions + 'static,
    ) -> Self {
        self.marker_source = MarkerSource::PerShape(Rc::new(f));
        self
    }
}
