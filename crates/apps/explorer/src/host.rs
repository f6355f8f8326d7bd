//! Narrow interfaces to the page hosting the explorer.

use std::rc::Rc;

use layers::{MapView, SharedMap};
use streaming::RemoteResource;

use crate::engine::NetworkBuilder;
use crate::settings::SettingsSource;

/// The "import current view" button.
pub trait ImportTrigger {
    fn set_label(&self, label: &str);
    fn set_enabled(&self, enabled: bool);
}

/// Per-scenario actions offered next to the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioControl {
    /// Build derived layers from a built-in test case's input.
    GenerateDetails,
    DownloadInput { file_name: String },
    ResetView,
}

impl ScenarioControl {
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioControl::GenerateDetails => "Generate Details",
            ScenarioControl::DownloadInput { .. } => "Download osm.xml",
            ScenarioControl::ResetView => "Reset view",
        }
    }
}

pub trait ControlsTarget {
    /// Selects the scenario in the test list (`"dynamic"` for imports).
    fn select_scenario(&self, selector_value: &str);
    /// Replaces the scenario controls.
    fn render_controls(&self, controls: &[ScenarioControl]);
}

/// Blocking, human-readable messages.
pub trait Notifier {
    fn alert(&self, message: &str);
}

pub trait Downloader {
    fn save(&self, file_name: &str, contents: &str);
}

/// The scenario selector persisted in the page URL.
pub trait UrlState {
    fn scenario_param(&self) -> Option<String>;
    fn clear_scenario_param(&self);
}

/// Everything an `ExplorerSession` talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub map: SharedMap,
    pub view: Rc<dyn MapView>,
    pub fixtures: Rc<dyn RemoteResource>,
    pub overpass: Rc<dyn RemoteResource>,
    pub builder: Rc<dyn NetworkBuilder>,
    pub settings: Rc<dyn SettingsSource>,
    pub trigger: Rc<dyn ImportTrigger>,
    pub controls: Rc<dyn ControlsTarget>,
    pub notifier: Rc<dyn Notifier>,
    pub downloader: Rc<dyn Downloader>,
    pub url: Rc<dyn UrlState>,
}
