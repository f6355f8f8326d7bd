use tracing::debug;

use crate::entry::LayerEntry;
use crate::error::LayerError;
use crate::group::LayerGroup;
use crate::sequential::SequentialLayerGroup;

/// A top-level registry entry.
#[derive(Debug)]
pub enum Group {
    Layers(LayerGroup),
    Sequence(SequentialLayerGroup),
}

impl Group {
    pub fn name(&self) -> &str {
        match self {
            Group::Layers(g) => g.name(),
            Group::Sequence(s) => s.name(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            Group::Layers(g) => g.is_enabled(),
            Group::Sequence(s) => s.is_enabled(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), LayerError> {
        match self {
            Group::Layers(g) => g.set_enabled(enabled),
            Group::Sequence(s) => s.set_enabled(enabled),
        }
    }

    pub fn as_layers(&self) -> Option<&LayerGroup> {
        match self {
            Group::Layers(g) => Some(g),
            Group::Sequence(_) => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&SequentialLayerGroup> {
        match self {
            Group::Sequence(s) => Some(s),
            Group::Layers(_) => None,
        }
    }
}

impl From<LayerGroup> for Group {
    fn from(g: LayerGroup) -> Self {
        Group::Layers(g)
    }
}

impl From<SequentialLayerGroup> for Group {
    fn from(s: SequentialLayerGroup) -> Self {
        Group::Sequence(s)
    }
}

/// The set of groups currently on the map.
///
/// Ordering contract:
/// - groups keep insertion order;
/// - top-level names are unique (`add_group` rejects collisions).
///
/// Every overlay on the map belongs to a registered group: removing a group
/// drops it, which hides whatever it still draws.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    groups: Vec<Group>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.groups.iter().map(Group::name).collect()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Appends a group. A name collision is a caller bug and is rejected; the
    /// rejected group is dropped and leaves nothing on the map.
    pub fn add_group(&mut self, group: impl Into<Group>) -> Result<(), LayerError> {
        let group = group.into();
        if self.groups.iter().any(|g| g.name() == group.name()) {
            return Err(LayerError::DuplicateGroup(group.name().to_string()));
        }
        debug!("adding group {}", group.name());
        self.groups.push(group);
        Ok(())
    }

    /// Removes every group whose name matches, hiding its overlays before
    /// returning. Returns how many groups were removed.
    pub fn remove_groups(&mut self, mut predicate: impl FnMut(&str) -> bool) -> usize {
        let before = self.groups.len();
        self.groups.retain(|g| !predicate(g.name()));
        let removed = before - self.groups.len();
        if removed > 0 {
            debug!("removed {removed} groups");
        }
        removed
    }

    pub fn clear(&mut self) -> usize {
        self.remove_groups(|_| true)
    }

    pub fn group(&self, name: &str) -> Result<&Group, LayerError> {
        self.groups
            .iter()
            .find(|g| g.name() == name)
            .ok_or_else(|| LayerError::GroupNotFound(name.to_string()))
    }

    pub fn group_mut(&mut self, name: &str) -> Result<&mut Group, LayerError> {
        self.groups
            .iter_mut()
            .find(|g| g.name() == name)
            .ok_or_else(|| LayerError::GroupNotFound(name.to_string()))
    }

    pub fn layer_group(&self, name: &str) -> Result<&LayerGroup, LayerError> {
        self.group(name)?
            .as_layers()
            .ok_or_else(|| LayerError::NotALayerGroup(name.to_string()))
    }

    pub fn layer_group_mut(&mut self, name: &str) -> Result<&mut LayerGroup, LayerError> {
        match self.group_mut(name)? {
            Group::Layers(g) => Ok(g),
            Group::Sequence(_) => Err(LayerError::NotALayerGroup(name.to_string())),
        }
    }

    pub fn sequence(&self, name: &str) -> Result<&SequentialLayerGroup, LayerError> {
        self.group(name)?
            .as_sequence()
            .ok_or_else(|| LayerError::NotASequence(name.to_string()))
    }

    pub fn sequence_mut(&mut self, name: &str) -> Result<&mut SequentialLayerGroup, LayerError> {
        match self.group_mut(name)? {
            Group::Sequence(s) => Ok(s),
            Group::Layers(_) => Err(LayerError::NotASequence(name.to_string())),
        }
    }

    pub fn layer(&self, group: &str, layer: &str) -> Result<&LayerEntry, LayerError> {
        self.layer_group(group)?.layer(layer)
    }

    pub fn set_group_enabled(&mut self, name: &str, enabled: bool) -> Result<(), LayerError> {
        self.group_mut(name)?.set_enabled(enabled)
    }

    pub fn set_layer_enabled(
        &mut self,
        group: &str,
        layer: &str,
        enabled: bool,
    ) -> Result<(), LayerError> {
        self.layer_group_mut(group)?.set_layer_enabled(layer, enabled)
    }

    /// `(group, layer)` names of every drawn layer, in registry order. Steps of a
    /// sequence report the step's group name.
    pub fn visible_layers(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for group in &self.groups {
            match group {
                Group::Layers(g) => out.extend(
                    g.visible_layers()
                        .map(|l| (g.name().to_string(), l.to_string())),
                ),
                Group::Sequence(s) => out.extend(
                    s.visible_layers()
                        .map(|(g, l)| (g.to_string(), l.to_string())),
                ),
            }
        }
        out
    }
}
