//! Interactive bindings and their transfer onto substitute markers.
//!
//! A layer carries popup content, tooltip content and ordered event-listener
//! sequences. When a shape is collapsed into a marker, [`copy_into`] captures
//! all of that from the shape, and transitively from containing groups that
//! are not themselves live on the map, so the marker behaves exactly like
//! the geometry it replaces.
//!
//! Group traversal is a directed graph walk with an explicit visited set:
//! diamond-shaped parent graphs are copied once, and accidental cycles
//! terminate instead of recursing forever.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::error::LayerError;

use super::{LayerId, LayerStore};

/// An event dispatched to layer or marker listeners.
#[derive(Debug, Clone)]
pub struct LayerEvent {
    /// The layer the event was fired on (for markers, the shape they stand
    /// in for).
    pub target: LayerId,
    /// Event name, e.g. `"click"`.
    pub name: String,
}

/// An event listener callback.
///
/// Listeners are reference-counted so copying a binding onto a marker shares
/// the callback rather than duplicating it. The whole component is
/// single-threaded and event-driven, so no `Send`/`Sync` bound is needed.
pub type Listener = Rc<dyn Fn(&LayerEvent)>;

/// Popup, tooltip and event-listener state of one layer or marker.
#[derive(Default, Clone)]
pub struct Bindings {
    popup: Option<String>,
    tooltip: Option<String>,
    events: HashMap<String, Vec<Listener>>,
}

impl Bindings {
    /// Bind popup content, replacing any existing popup.
    pub fn bind_popup(&mut self, content: impl Into<String>) {
        self.popup = Some(content.into());
    }

    /// Bind tooltip content, replacing any existing tooltip.
    pub fn bind_tooltip(&mut self, content: impl Into<String>) {
        self.tooltip = Some(content.into());
    }

    /// Bound popup content, if any. Presence is the "has been bound" flag.
    pub fn popup(&self) -> Option<&str> {
        self.popup.as_deref()
    }

    /// Bound tooltip content, if any.
    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Register a listener for an event, after any existing listeners.
    pub fn on(&mut self, event: impl Into<String>, listener: Listener) {
        self.events.entry(event.into()).or_default().push(listener);
    }

    /// Listeners registered for an event, in registration order.
    pub fn listeners(&self, event: &str) -> &[Listener] {
        self.events.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dispatch an event to its listeners.
    pub fn fire(&self, event: &LayerEvent) {
        for listener in self.listeners(&event.name) {
            listener(event);
        }
    }

    /// Append every listener sequence of `self` onto `target`, preserving
    /// per-event registration order.
    fn append_events_to(&self, target: &mut Bindings) {
        for (event, listeners) in &self.events {
            let slot = target.events.entry(event.clone()).or_default();
            slot.extend(listeners.iter().cloned());
        }
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<(&str, usize)> = self
            .events
            .iter()
            .map(|(name, listeners)| (name.as_str(), listeners.len()))
            .collect();
        events.sort_unstable();
        f.debug_struct("Bindings")
            .field("popup", &self.popup)
            .field("tooltip", &self.tooltip)
            .field("events", &events)
            .finish()
    }
}

/// Copy the interactive bindings of `source` (and of its containing groups)
/// into `target`, typically a substitute marker's bindings.
///
/// Mirrors how a map engine resolves interactions at render time:
///
/// 1. the source's own popup, tooltip and listeners are copied first;
/// 2. each containing group that is *not* directly attached to the map is
///    walked recursively: its listeners are appended to `target`, its
///    popup/tooltip replace the ones copied so far, and its popup/tooltip are
///    also inherited by the member layer itself (a shape inside a popup-bound
///    group answers with the group's popup);
/// 3. groups already live on the map are skipped, since their bindings are
///    dispatched independently by the map.
///
/// The source's own bindings are not mutated except for the group
/// popup/tooltip inheritance in step 2.
pub(crate) fn copy_into(
    store: &mut LayerStore,
    source: LayerId,
    target: &mut Bindings,
) -> Result<(), LayerError> {
    let mut visited = HashSet::new();
    copy_from(store, source, target, &mut visited)
}

fn copy_from(
    store: &mut LayerStore,
    layer: LayerId,
    target: &mut Bindings,
    visited: &mut HashSet<LayerId>,
) -> Result<(), LayerError> {
    if !visited.insert(layer) {
        return Ok(());
    }

    {
        let data = store.get(layer)?;
        if let Some(content) = data.bindings.popup() {
            let content = content.to_string();
            target.bind_popup(content);
        }
        if let Some(content) = data.bindings.tooltip() {
            let content = content.to_string();
            target.bind_tooltip(content);
        }
        data.bindings.append_events_to(target);
    }

    let parents = store.get(layer)?.parents.clone();
    for parent in parents {
        if store.get(parent)?.attached {
            continue;
        }
        copy_from(store, parent, target, visited)?;

        // The member inherits the group's popup/tooltip for its own
        // render-time interactions.
        let (popup, tooltip) = {
            let group = store.get(parent)?;
            (
                group.bindings.popup().map(String::from),
                group.bindings.tooltip().map(String::from),
            )
        };
        let data = store.get_mut(layer)?;
        if let Some(content) = popup {
            data.bindings.bind_popup(content);
        }
        if let Some(content) = tooltip {
            data.bindings.bind_tooltip(content);
        }
    }

    Ok(())
}
