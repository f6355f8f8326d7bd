use std::cell::{Cell, Ref, RefCell};

use layers::{Group, LayerError, LayerRegistry, MaterializeError, SharedMap};
use tracing::{debug, error, info, warn};

use crate::build::build_network_layers;
use crate::config::ExplorerConfig;
use crate::engine::NetworkBuilder;
use crate::error::ExplorerError;
use crate::host::{Collaborators, ScenarioControl};
use crate::import::{ImportState, ImportWorkflow};
use crate::scenario::{FIXTURE_GROUP, Scenario, ScenarioLoader};
use crate::settings::ImportSettings;

pub use crate::build::STEPS_GROUP;

pub const DETAILS_GROUP: &str = "Details";

/// What became of an "import current view" request.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Imported(Scenario),
    /// Another import was already running; nothing changed.
    Rejected,
    /// A newer scenario switch superseded this import before it finished.
    Discarded,
}

/// Top-level explorer state: the layer registry, the current scenario and
/// the import workflow.
///
/// Single-threaded. Methods take `&self` so that a switch suspended on a
/// fetch does not lock out other requests; no `RefCell` borrow is held across
/// an `.await`.
///
/// Ordering contract:
/// - every switch clears the registry before its loader runs;
/// - a loader installs groups only while its switch is the latest one;
/// - a failed switch leaves the registry empty and no scenario current.
pub struct ExplorerSession {
    deps: Collaborators,
    config: ExplorerConfig,
    registry: RefCell<LayerRegistry>,
    current: RefCell<Option<Scenario>>,
    generation: Cell<u64>,
    import: ImportWorkflow,
}

impl ExplorerSession {
    pub fn new(deps: Collaborators, config: ExplorerConfig) -> Self {
        let import = ImportWorkflow::new(deps.trigger.clone(), deps.overpass.clone());
        Self {
            deps,
            config,
            registry: RefCell::new(LayerRegistry::new()),
            current: RefCell::new(None),
            generation: Cell::new(0),
            import,
        }
    }

    /// Builds a session and loads the test case named in the URL, if any.
    ///
    /// A failing test case is reported through the notifier; the session is
    /// returned either way.
    pub async fn create(deps: Collaborators, config: ExplorerConfig) -> Self {
        let session = Self::new(deps, config);
        if let Some(name) = session.deps.url.scenario_param() {
            info!("loading test {name} from URL");
            if let Err(err) = session.load_fixture(&name).await {
                debug!("initial test {name} not loaded: {err}");
            }
        }
        session
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn registry(&self) -> Ref<'_, LayerRegistry> {
        self.registry.borrow()
    }

    pub fn current_scenario(&self) -> Option<Scenario> {
        self.current.borrow().clone()
    }

    pub fn import_state(&self) -> ImportState {
        self.import.state()
    }

    /// Replaces the current scenario with whatever `loader` produces.
    ///
    /// Returns `Ok(None)` when a newer switch started while this one was
    /// suspended; the newer switch owns the registry and is left untouched.
    pub async fn switch_scenario(
        &self,
        loader: ScenarioLoader,
    ) -> Result<Option<Scenario>, ExplorerError> {
        let removed = self.registry.borrow_mut().clear();
        self.current.replace(None);
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        info!("switching to {loader} (generation {generation}, removed {removed} groups)");

        match loader.load(self, generation).await {
            Ok(Some(scenario)) => {
                self.deps.view.fit_bounds(scenario.bounds());
                self.deps.controls.select_scenario(scenario.selector_value());
                self.deps.controls.render_controls(&scenario.controls());
                self.current.replace(Some(scenario.clone()));
                Ok(Some(scenario))
            }
            Ok(None) => {
                debug!("switch {generation} superseded");
                Ok(None)
            }
            Err(err) if self.is_current(generation) => {
                error!("switch {generation} failed at {}: {err}", err.stage());
                self.registry.borrow_mut().clear();
                self.deps.notifier.alert(&format!("Import failed: {err}"));
                Err(err)
            }
            Err(err) => {
                warn!("superseded switch {generation} failed: {err}");
                Err(err)
            }
        }
    }

    pub async fn load_fixture(&self, name: &str) -> Result<Option<Scenario>, ExplorerError> {
        self.switch_scenario(ScenarioLoader::fixture(name)).await
    }

    /// Imports the area currently in view from Overpass.
    ///
    /// Refused below the configured zoom before anything is cleared. A request
    /// made while another import runs is a no-op.
    pub async fn import_current_view(&self) -> Result<ImportOutcome, ExplorerError> {
        let zoom = self.deps.view.zoom();
        if zoom < self.config.min_import_zoom {
            let err = ExplorerError::ZoomTooLow {
                zoom,
                min: self.config.min_import_zoom,
            };
            self.deps.notifier.alert(&err.to_string());
            return Err(err);
        }
        let Some(guard) = self.import.try_begin() else {
            return Ok(ImportOutcome::Rejected);
        };
        let loader = ScenarioLoader::ImportedView {
            guard,
            bounds: self.deps.view.view_bounds(),
            settings: self.import_settings(),
        };
        Ok(match self.switch_scenario(loader).await? {
            Some(scenario) => ImportOutcome::Imported(scenario),
            None => ImportOutcome::Discarded,
        })
    }

    /// Runs the engine on the current test case's input next to its reference
    /// layers, which are hidden.
    pub fn generate_details(&self) -> Result<(), ExplorerError> {
        let raw = match self.current.borrow().as_ref() {
            Some(scenario) if scenario.is_fixture() => scenario.raw_input().clone(),
            _ => return Err(ExplorerError::NotAFixture),
        };
        {
            let mut registry = self.registry.borrow_mut();
            registry.remove_groups(|name| name != FIXTURE_GROUP);
            registry.group_mut(FIXTURE_GROUP)?.set_enabled(false)?;
        }

        let built = build_network_layers(
            DETAILS_GROUP,
            &raw,
            &self.import_settings(),
            self.builder(),
            &self.map(),
            false,
        );
        let built = match built {
            Ok(built) => built,
            Err(err) => {
                error!("generating details failed: {err}");
                self.deps.notifier.alert(&format!("Import failed: {err}"));
                return Err(err);
            }
        };
        let (groups, failures) = built.into_groups();
        self.install(self.generation.get(), groups)?;
        self.report_failures(&failures);
        Ok(())
    }

    pub fn download_input(&self) -> Result<(), ExplorerError> {
        let current = self.current.borrow();
        let scenario = current.as_ref().ok_or(ExplorerError::NoScenario)?;
        self.deps
            .downloader
            .save(&scenario.download_file_name(), scenario.raw_input());
        Ok(())
    }

    pub fn reset_view(&self) -> Result<(), ExplorerError> {
        let bounds = self
            .current
            .borrow()
            .as_ref()
            .map(Scenario::bounds)
            .ok_or(ExplorerError::NoScenario)?;
        self.deps.view.fit_bounds(bounds);
        Ok(())
    }

    pub fn run_control(&self, control: &ScenarioControl) -> Result<(), ExplorerError> {
        debug!("running control {}", control.label());
        match control {
            ScenarioControl::GenerateDetails => self.generate_details(),
            ScenarioControl::DownloadInput { .. } => self.download_input(),
            ScenarioControl::ResetView => self.reset_view(),
        }
    }

    /// Shows the next transformation step.
    pub fn step_forward(&self) -> Result<Option<usize>, ExplorerError> {
        let result = self
            .registry
            .borrow_mut()
            .sequence_mut(STEPS_GROUP)
            .and_then(|steps| steps.advance());
        self.surface(result)
    }

    pub fn step_back(&self) -> Result<Option<usize>, ExplorerError> {
        let result = self
            .registry
            .borrow_mut()
            .sequence_mut(STEPS_GROUP)
            .and_then(|steps| steps.retreat());
        self.surface(result)
    }

    pub fn jump_to_step(&self, index: usize) -> Result<Option<usize>, ExplorerError> {
        let result = self
            .registry
            .borrow_mut()
            .sequence_mut(STEPS_GROUP)
            .and_then(|steps| steps.jump(index));
        self.surface(result)
    }

    pub fn set_group_enabled(&self, group: &str, enabled: bool) -> Result<(), ExplorerError> {
        let result = self.registry.borrow_mut().set_group_enabled(group, enabled);
        self.surface(result)
    }

    pub fn set_layer_enabled(
        &self,
        group: &str,
        layer: &str,
        enabled: bool,
    ) -> Result<(), ExplorerError> {
        let result = self
            .registry
            .borrow_mut()
            .set_layer_enabled(group, layer, enabled);
        self.surface(result)
    }

    pub(crate) fn map(&self) -> SharedMap {
        self.deps.map.clone()
    }

    pub(crate) fn builder(&self) -> &dyn NetworkBuilder {
        self.deps.builder.as_ref()
    }

    pub(crate) fn import_workflow(&self) -> &ImportWorkflow {
        &self.import
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    pub(crate) async fn fetch_fixture(&self, path: &str) -> Result<String, ExplorerError> {
        debug!("loading {path} from {}", self.deps.fixtures.describe());
        self.deps
            .fixtures
            .fetch(path)
            .await
            .map_err(|source| ExplorerError::Fetch {
                what: path.to_string(),
                source,
            })
    }

    /// Adds `groups` to the registry unless `generation` was superseded, in
    /// which case they are dropped (and leave nothing on the map).
    pub(crate) fn install(&self, generation: u64, groups: Vec<Group>) -> Result<bool, LayerError> {
        if !self.is_current(generation) {
            debug!("discarding {} groups from superseded switch {generation}", groups.len());
            return Ok(false);
        }
        let mut registry = self.registry.borrow_mut();
        for group in groups {
            registry.add_group(group)?;
        }
        Ok(true)
    }

    pub(crate) fn report_failures(&self, failures: &[MaterializeError]) {
        for failure in failures {
            warn!("{failure}");
            self.deps.notifier.alert(&failure.to_string());
        }
    }

    pub(crate) fn clear_scenario_param(&self) {
        self.deps.url.clear_scenario_param();
    }

    /// Settings snapshot for one build. An unreadable settings source falls
    /// back to defaults.
    pub(crate) fn import_settings(&self) -> ImportSettings {
        match self.deps.settings.import_settings() {
            Ok(settings) => settings,
            Err(err) => {
                warn!("failed to read import settings, using defaults: {err}");
                ImportSettings::default()
            }
        }
    }

    fn surface<T>(&self, result: Result<T, LayerError>) -> Result<T, ExplorerError> {
        result.map_err(|err| {
            if let LayerError::Materialize(failures) = &err {
                self.report_failures(failures.errors());
            }
            ExplorerError::from(err)
        })
    }
}
