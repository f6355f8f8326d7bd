use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use foundation::GeoBounds;

use crate::layer::{Layer, LayerKind};

/// Handle for one overlay currently drawn on the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayId(pub u64);

/// The overlay side of the base map widget.
///
/// Methods take `&self`: the widget is a shared handle and keeps its own state.
pub trait MapSurface {
    fn show(&self, layer: &Layer) -> OverlayId;
    fn hide(&self, overlay: OverlayId);
}

/// The viewport side of the base map widget.
pub trait MapView {
    fn view_bounds(&self) -> GeoBounds;
    fn zoom(&self) -> f64;
    fn fit_bounds(&self, bounds: GeoBounds);
}

pub type SharedMap = Rc<dyn MapSurface>;

/// In-memory map used for headless sessions and tests.
///
/// Overlays are kept in show order (`OverlayId`s are allocated monotonically).
#[derive(Debug)]
pub struct HeadlessMap {
    next_overlay: Cell<u64>,
    overlays: RefCell<BTreeMap<OverlayId, Layer>>,
    view: Cell<GeoBounds>,
    zoom: Cell<f64>,
    fits: Cell<u32>,
}

impl HeadlessMap {
    pub fn new(view: GeoBounds, zoom: f64) -> Self {
        Self {
            next_overlay: Cell::new(0),
            overlays: RefCell::new(BTreeMap::new()),
            view: Cell::new(view),
            zoom: Cell::new(zoom),
            fits: Cell::new(0),
        }
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.borrow().len()
    }

    pub fn overlay_kinds(&self) -> Vec<LayerKind> {
        self.overlays.borrow().values().map(Layer::kind).collect()
    }

    pub fn is_shown(&self, overlay: OverlayId) -> bool {
        self.overlays.borrow().contains_key(&overlay)
    }

    pub fn set_zoom(&self, zoom: f64) {
        self.zoom.set(zoom);
    }

    /// Pans the view without counting as a fit.
    pub fn set_view(&self, bounds: GeoBounds) {
        self.view.set(bounds);
    }

    /// Number of `fit_bounds` calls so far.
    pub fn fit_count(&self) -> u32 {
        self.fits.get()
    }
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new(GeoBounds::new(-85.0, -180.0, 85.0, 180.0), 0.0)
    }
}

impl MapSurface for HeadlessMap {
    fn show(&self, layer: &Layer) -> OverlayId {
        let id = OverlayId(self.next_overlay.get());
        self.next_overlay.set(id.0 + 1);
        self.overlays.borrow_mut().insert(id, layer.clone());
        id
    }

    fn hide(&self, overlay: OverlayId) {
        self.overlays.borrow_mut().remove(&overlay);
    }
}

impl MapView for HeadlessMap {
    fn view_bounds(&self) -> GeoBounds {
        self.view.get()
    }

    fn zoom(&self) -> f64 {
        self.zoom.get()
    }

    fn fit_bounds(&self, bounds: GeoBounds) {
        self.view.set(bounds);
        self.fits.set(self.fits.get() + 1);
    }
}
