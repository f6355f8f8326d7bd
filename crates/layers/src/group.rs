use tracing::{debug, warn};

use crate::entry::{LayerEntry, LayerProducer};
use crate::error::{LayerError, MaterializeError, MaterializeFailures, ProducerError};
use crate::layer::Layer;
use crate::map::SharedMap;

/// Named, ordered set of layers with a cascading enable toggle.
///
/// An entry is drawn iff both the group and the entry are enabled. Dropping a
/// group removes every overlay it still has on the map.
pub struct LayerGroup {
    name: String,
    map: SharedMap,
    entries: Vec<LayerEntry>,
    enabled: bool,
}

impl std::fmt::Debug for LayerGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerGroup")
            .field("name", &self.name)
            .field("entries", &self.entries)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl LayerGroup {
    pub fn new(name: impl Into<String>, map: SharedMap) -> Self {
        Self {
            name: name.into(),
            map,
            entries: Vec::new(),
            enabled: true,
        }
    }

    /// A group that starts disabled, so nothing it registers is drawn (or
    /// materialized) until it is enabled.
    pub fn hidden(name: impl Into<String>, map: SharedMap) -> Self {
        let mut group = Self::new(name, map);
        group.enabled = false;
        group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn layers(&self) -> impl Iterator<Item = &LayerEntry> {
        self.entries.iter()
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.entries.iter().map(LayerEntry::name).collect()
    }

    pub fn layer(&self, name: &str) -> Result<&LayerEntry, LayerError> {
        self.entries
            .iter()
            .find(|e| e.name() == name)
            .ok_or_else(|| self.not_found(name))
    }

    /// Registers an eager layer. Drawn immediately if `enabled` and the group is enabled.
    pub fn add_layer(
        &mut self,
        name: impl Into<String>,
        layer: Layer,
        enabled: bool,
    ) -> Result<(), LayerError> {
        self.push(name.into(), LayerProducer::Eager(layer), enabled)
    }

    /// Registers a layer computed on first display. Enabled by default, so it
    /// materializes right away when the group is enabled.
    ///
    /// A failing thunk is reported as `LayerError::Materialize`; the entry stays
    /// registered (hidden, unmaterialized) and can be retried by re-enabling it.
    pub fn add_lazy_layer<F>(&mut self, name: impl Into<String>, thunk: F) -> Result<(), LayerError>
    where
        F: Fn() -> Result<Layer, ProducerError> + 'static,
    {
        self.push(name.into(), LayerProducer::Lazy(Box::new(thunk)), true)
    }

    fn push(
        &mut self,
        name: String,
        producer: LayerProducer,
        enabled: bool,
    ) -> Result<(), LayerError> {
        if self.entries.iter().any(|e| e.name() == name) {
            return Err(LayerError::DuplicateLayer {
                group: self.name.clone(),
                layer: name,
            });
        }
        self.entries.push(LayerEntry::new(name, producer, enabled));
        let idx = self.entries.len() - 1;
        self.sync(idx)?;
        Ok(())
    }

    /// Sets every entry (and the group) to `enabled`.
    ///
    /// Disabling only hides overlays; materialized payloads are kept so that
    /// re-enabling never recomputes them.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), LayerError> {
        if !enabled {
            self.disable();
            return Ok(());
        }
        self.enabled = true;
        let mut failures = Vec::new();
        for idx in 0..self.entries.len() {
            self.entries[idx].enabled = true;
            if let Err(e) = self.sync(idx) {
                failures.push(e);
            }
        }
        MaterializeFailures::check(failures)?;
        Ok(())
    }

    /// Infallible half of `set_enabled`.
    pub fn disable(&mut self) {
        self.enabled = false;
        for entry in &mut self.entries {
            entry.enabled = false;
            entry.conceal(self.map.as_ref());
        }
    }

    /// Per-layer toggle; only drawn while the group itself is enabled.
    pub fn set_layer_enabled(&mut self, name: &str, enabled: bool) -> Result<(), LayerError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.name() == name)
            .ok_or_else(|| self.not_found(name))?;
        self.entries[idx].enabled = enabled;
        self.sync(idx)?;
        Ok(())
    }

    /// Names of the layers currently drawn, in registration order.
    pub fn visible_layers(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.is_visible())
            .map(LayerEntry::name)
    }

    fn sync(&mut self, idx: usize) -> Result<(), MaterializeError> {
        let show = self.enabled && self.entries[idx].enabled;
        let entry = &mut self.entries[idx];
        if !show {
            entry.conceal(self.map.as_ref());
            return Ok(());
        }
        match entry.display(self.map.as_ref()) {
            Ok(()) => Ok(()),
            Err(source) => {
                entry.enabled = false;
                warn!(
                    "layer {} in group {} failed to materialize: {source}",
                    entry.name(),
                    self.name
                );
                Err(MaterializeError {
                    group: self.name.clone(),
                    layer: entry.name().to_string(),
                    source,
                })
            }
        }
    }

    fn not_found(&self, layer: &str) -> LayerError {
        LayerError::LayerNotFound {
            group: self.name.clone(),
            layer: layer.to_string(),
        }
    }
}

impl Drop for LayerGroup {
    fn drop(&mut self) {
        let mut hidden = 0;
        for entry in &mut self.entries {
            if entry.is_visible() {
                hidden += 1;
            }
            entry.conceal(self.map.as_ref());
        }
        if hidden > 0 {
            debug!("dropped group {} with {hidden} visible overlays", self.name);
        }
    }
}
