use std::fmt;

use crate::error::ProducerError;
use crate::layer::Layer;
use crate::map::{MapSurface, OverlayId};

pub type LayerThunk = Box<dyn Fn() -> Result<Layer, ProducerError>>;

/// Where an entry's payload comes from.
pub enum LayerProducer {
    Eager(Layer),
    /// Evaluated the first time the entry is displayed.
    Lazy(LayerThunk),
}

impl fmt::Debug for LayerProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerProducer::Eager(layer) => f.debug_tuple("Eager").field(&layer.kind()).finish(),
            LayerProducer::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// One named layer inside a `LayerGroup`.
///
/// Invariants:
/// - a lazy producer is never invoked again once it has produced a value;
/// - `overlay` is `Some` iff the layer is currently drawn on the map.
#[derive(Debug)]
pub struct LayerEntry {
    name: String,
    producer: LayerProducer,
    cached: Option<Layer>,
    pub(crate) enabled: bool,
    overlay: Option<OverlayId>,
}

impl LayerEntry {
    pub(crate) fn new(name: String, producer: LayerProducer, enabled: bool) -> Self {
        Self {
            name,
            producer,
            cached: None,
            enabled,
            overlay: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_visible(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.producer, LayerProducer::Lazy(_))
    }

    pub fn is_materialized(&self) -> bool {
        self.cached.is_some()
    }

    /// The payload, if it has been produced.
    pub fn layer(&self) -> Option<&Layer> {
        self.cached.as_ref()
    }

    fn materialize(&mut self) -> Result<&Layer, ProducerError> {
        let layer = match self.cached.take() {
            Some(layer) => layer,
            None => match &self.producer {
                LayerProducer::Eager(layer) => layer.clone(),
                LayerProducer::Lazy(thunk) => thunk()?,
            },
        };
        Ok(self.cached.insert(layer))
    }

    pub(crate) fn display(&mut self, map: &dyn MapSurface) -> Result<(), ProducerError> {
        if self.overlay.is_some() {
            return Ok(());
        }
        let overlay = map.show(self.materialize()?);
        self.overlay = Some(overlay);
        Ok(())
    }

    pub(crate) fn conceal(&mut self, map: &dyn MapSurface) {
        if let Some(overlay) = self.overlay.take() {
            map.hide(overlay);
        }
    }
}
