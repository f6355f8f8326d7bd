use tracing::debug;

use crate::error::LayerError;
use crate::group::LayerGroup;

/// Ordered timeline of `LayerGroup`s with at most one step drawn at a time.
///
/// Every step starts disabled and no step is active until the first
/// `advance` / `retreat` / `jump`. Navigation clamps at both ends.
#[derive(Debug)]
pub struct SequentialLayerGroup {
    name: String,
    steps: Vec<LayerGroup>,
    current: Option<usize>,
    enabled: bool,
}

impl SequentialLayerGroup {
    pub fn new(name: impl Into<String>, mut steps: Vec<LayerGroup>) -> Self {
        for step in &mut steps {
            step.disable();
        }
        Self {
            name: name.into(),
            steps,
            current: None,
            enabled: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[LayerGroup] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(LayerGroup::name).collect()
    }

    /// Index of the active step, `None` before the user navigates.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn current_step(&self) -> Option<&LayerGroup> {
        self.current.and_then(|i| self.steps.get(i))
    }

    pub fn current_step_mut(&mut self) -> Option<&mut LayerGroup> {
        self.current.and_then(|i| self.steps.get_mut(i))
    }

    /// Moves to the next step (the first one if none is active yet).
    pub fn advance(&mut self) -> Result<Option<usize>, LayerError> {
        let Some(last) = self.steps.len().checked_sub(1) else {
            return Ok(None);
        };
        let next = match self.current {
            None => 0,
            Some(i) => (i + 1).min(last),
        };
        self.activate(next)
    }

    /// Moves to the previous step (the first one if none is active yet).
    pub fn retreat(&mut self) -> Result<Option<usize>, LayerError> {
        if self.steps.is_empty() {
            return Ok(None);
        }
        let prev = self.current.map_or(0, |i| i.saturating_sub(1));
        self.activate(prev)
    }

    pub fn jump(&mut self, index: usize) -> Result<Option<usize>, LayerError> {
        if index >= self.steps.len() {
            return Err(LayerError::StepOutOfRange {
                group: self.name.clone(),
                index,
                len: self.steps.len(),
            });
        }
        self.activate(index)
    }

    /// Hides or re-shows the active step without losing the position.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), LayerError> {
        self.enabled = enabled;
        let Some(step) = self.current.and_then(|i| self.steps.get_mut(i)) else {
            return Ok(());
        };
        if enabled {
            step.set_enabled(true)
        } else {
            step.disable();
            Ok(())
        }
    }

    /// Names of the layers drawn by the active step.
    pub fn visible_layers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.steps
            .iter()
            .flat_map(|g| g.visible_layers().map(move |l| (g.name(), l)))
    }

    fn activate(&mut self, index: usize) -> Result<Option<usize>, LayerError> {
        if self.current == Some(index) {
            return Ok(self.current);
        }
        if let Some(prev) = self.current.and_then(|i| self.steps.get_mut(i)) {
            prev.disable();
        }
        self.current = Some(index);
        debug!("{}: showing step {index} ({})", self.name, self.steps[index].name());
        if self.enabled {
            self.steps[index].set_enabled(true)?;
        }
        Ok(self.current)
    }
}
