//! Fake collaborators for session tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use foundation::GeoBounds;
use layers::HeadlessMap;
use streaming::{BoxFuture, FetchError, RemoteResource};
use tokio::sync::Notify;

use crate::config::ExplorerConfig;
use crate::engine::{DebugStep, EngineError, Network, NetworkBuilder};
use crate::host::{
    Collaborators, ControlsTarget, Downloader, ImportTrigger, Notifier, ScenarioControl, UrlState,
};
use crate::import::IDLE_LABEL;
use crate::session::ExplorerSession;
use crate::settings::{ImportSettings, SettingsError, SettingsSource};

pub const OSM_BODY: &str = r#"<osm version="0.6"><node id="1" lat="47.6" lon="-122.3"/></osm>"#;

pub const GEOMETRY_BODY: &str = r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},"geometry":{"type":"LineString","coordinates":[[-122.31,47.60],[-122.30,47.61]]}}]}"#;

const EMPTY_COLLECTION: &str = r#"{"type":"FeatureCollection","features":[]}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeExport {
    Geometry,
    LanePolygons,
    LaneMarkings,
    IntersectionMarkings,
    RoadOrdering,
    Movements,
}

/// Engine double: every export returns a fixed document unless told to fail.
pub struct FakeBuilder {
    steps: usize,
    construct_error: Option<String>,
    fail: Option<FakeExport>,
    exports: Rc<Cell<usize>>,
    last_settings: Cell<Option<ImportSettings>>,
}

impl FakeBuilder {
    /// Records `steps` debug steps when built with `debug_each_step`.
    pub fn new(steps: usize) -> Self {
        Self {
            steps,
            construct_error: None,
            fail: None,
            exports: Rc::new(Cell::new(0)),
            last_settings: Cell::new(None),
        }
    }

    pub fn failing_construct(mut self, message: &str) -> Self {
        self.construct_error = Some(message.to_string());
        self
    }

    pub fn failing_export(mut self, export: FakeExport) -> Self {
        self.fail = Some(export);
        self
    }

    /// Export calls across every network this builder produced.
    pub fn export_calls(&self) -> usize {
        self.exports.get()
    }

    pub fn last_settings(&self) -> Option<ImportSettings> {
        self.last_settings.get()
    }
}

impl NetworkBuilder for FakeBuilder {
    fn construct(
        &self,
        _raw_input: &str,
        settings: &ImportSettings,
    ) -> Result<Rc<dyn Network>, EngineError> {
        self.last_settings.set(Some(*settings));
        if let Some(message) = &self.construct_error {
            return Err(EngineError::new(message.clone()));
        }
        let steps = if settings.debug_each_step { self.steps } else { 0 };
        Ok(Rc::new(FakeNetwork {
            steps,
            fail: self.fail,
            exports: self.exports.clone(),
        }))
    }
}

struct FakeNetwork {
    steps: usize,
    fail: Option<FakeExport>,
    exports: Rc<Cell<usize>>,
}

impl FakeNetwork {
    fn export(&self, which: FakeExport, body: &str) -> Result<String, EngineError> {
        self.exports.set(self.exports.get() + 1);
        if self.fail == Some(which) {
            return Err(EngineError::new(format!("{which:?} export failed")));
        }
        Ok(body.to_string())
    }
}

impl Network for FakeNetwork {
    fn to_geojson_plain(&self) -> Result<String, EngineError> {
        self.export(FakeExport::Geometry, GEOMETRY_BODY)
    }

    fn to_lane_polygons_geojson(&self) -> Result<String, EngineError> {
        self.export(FakeExport::LanePolygons, EMPTY_COLLECTION)
    }

    fn to_lane_markings_geojson(&self) -> Result<String, EngineError> {
        self.export(FakeExport::LaneMarkings, EMPTY_COLLECTION)
    }

    fn to_intersection_markings_geojson(&self) -> Result<String, EngineError> {
        self.export(FakeExport::IntersectionMarkings, EMPTY_COLLECTION)
    }

    fn debug_clockwise_ordering_geojson(&self) -> Result<String, EngineError> {
        self.export(FakeExport::RoadOrdering, EMPTY_COLLECTION)
    }

    fn debug_movements_geojson(&self) -> Result<String, EngineError> {
        self.export(FakeExport::Movements, EMPTY_COLLECTION)
    }

    fn debug_steps(&self) -> Result<Vec<Rc<dyn DebugStep>>, EngineError> {
        Ok((0..self.steps)
            .map(|index| {
                Rc::new(FakeStep {
                    index,
                    network: Rc::new(FakeNetwork {
                        steps: 0,
                        fail: self.fail,
                        exports: self.exports.clone(),
                    }),
                }) as Rc<dyn DebugStep>
            })
            .collect())
    }
}

/// Even-numbered steps carry a debug payload.
struct FakeStep {
    index: usize,
    network: Rc<FakeNetwork>,
}

impl DebugStep for FakeStep {
    fn label(&self) -> String {
        format!("pass {}", self.index + 1)
    }

    fn network(&self) -> Rc<dyn Network> {
        self.network.clone()
    }

    fn to_debug_geojson(&self) -> Option<String> {
        (self.index % 2 == 0).then(|| EMPTY_COLLECTION.to_string())
    }
}

/// Resource serving canned bodies. Unknown names are `NotFound`. When gated,
/// every fetch waits for one `notify_one` on the gate.
#[derive(Default)]
pub struct ScriptedResource {
    bodies: HashMap<String, String>,
    fallback: Option<String>,
    gate: Option<Arc<Notify>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedResource {
    pub fn with(mut self, name: &str, body: &str) -> Self {
        self.bodies.insert(name.to_string(), body.to_string());
        self
    }

    pub fn with_fallback(mut self, body: &str) -> Self {
        self.fallback = Some(body.to_string());
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Names fetched so far, in order.
    pub fn requests(&self) -> Arc<Mutex<Vec<String>>> {
        self.requests.clone()
    }
}

impl RemoteResource for ScriptedResource {
    fn describe(&self) -> String {
        "scripted resource".to_string()
    }

    fn fetch(&self, name: &str) -> BoxFuture<'_, Result<String, FetchError>> {
        let name = name.to_string();
        Box::pin(async move {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(name.clone());
            }
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.bodies
                .get(&name)
                .or(self.fallback.as_ref())
                .cloned()
                .ok_or(FetchError::NotFound { name })
        })
    }
}

/// The three files of one built-in test case.
pub fn fixture_files(name: &str) -> ScriptedResource {
    ScriptedResource::default()
        .with(&format!("{name}/input.osm"), OSM_BODY)
        .with(&format!("{name}/geometry.json"), GEOMETRY_BODY)
        .with(&format!("{name}/road_network.dot"), "digraph { a -> b }")
}

/// Records everything the session tells the page.
pub struct RecordingHost {
    label: RefCell<String>,
    enabled: Cell<bool>,
    alerts: RefCell<Vec<String>>,
    selected: RefCell<Option<String>>,
    controls: RefCell<Vec<ScenarioControl>>,
    downloads: RefCell<Vec<(String, String)>>,
    url_param: RefCell<Option<String>>,
    settings: Cell<ImportSettings>,
    settings_broken: Cell<bool>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            label: RefCell::new(IDLE_LABEL.to_string()),
            enabled: Cell::new(true),
            alerts: RefCell::default(),
            selected: RefCell::default(),
            controls: RefCell::default(),
            downloads: RefCell::default(),
            url_param: RefCell::default(),
            settings: Cell::new(ImportSettings::default()),
            settings_broken: Cell::new(false),
        }
    }
}

impl RecordingHost {
    pub fn trigger_label(&self) -> String {
        self.label.borrow().clone()
    }

    pub fn trigger_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    pub fn selected(&self) -> Option<String> {
        self.selected.borrow().clone()
    }

    pub fn controls(&self) -> Vec<ScenarioControl> {
        self.controls.borrow().clone()
    }

    pub fn downloads(&self) -> Vec<(String, String)> {
        self.downloads.borrow().clone()
    }

    pub fn url_param(&self) -> Option<String> {
        self.url_param.borrow().clone()
    }

    pub fn set_url_param(&self, name: &str) {
        self.url_param.replace(Some(name.to_string()));
    }

    pub fn set_settings(&self, settings: ImportSettings) {
        self.settings.set(settings);
    }

    pub fn break_settings(&self) {
        self.settings_broken.set(true);
    }
}

impl ImportTrigger for RecordingHost {
    fn set_label(&self, label: &str) {
        self.label.replace(label.to_string());
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }
}

impl ControlsTarget for RecordingHost {
    fn select_scenario(&self, selector_value: &str) {
        self.selected.replace(Some(selector_value.to_string()));
    }

    fn render_controls(&self, controls: &[ScenarioControl]) {
        self.controls.replace(controls.to_vec());
    }
}

impl Notifier for RecordingHost {
    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}

impl Downloader for RecordingHost {
    fn save(&self, file_name: &str, contents: &str) {
        self.downloads
            .borrow_mut()
            .push((file_name.to_string(), contents.to_string()));
    }
}

impl UrlState for RecordingHost {
    fn scenario_param(&self) -> Option<String> {
        self.url_param()
    }

    fn clear_scenario_param(&self) {
        self.url_param.replace(None);
    }
}

impl SettingsSource for RecordingHost {
    fn import_settings(&self) -> Result<ImportSettings, SettingsError> {
        if self.settings_broken.get() {
            return Err(SettingsError::Unavailable("settings form missing".to_string()));
        }
        Ok(self.settings.get())
    }
}

/// A session wired to a headless map and recording fakes, zoomed in far
/// enough to import.
pub struct Harness {
    pub session: ExplorerSession,
    pub map: Rc<HeadlessMap>,
    pub host: Rc<RecordingHost>,
    pub builder: Rc<FakeBuilder>,
}

impl Harness {
    pub fn new(fixtures: ScriptedResource, overpass: ScriptedResource, builder: FakeBuilder) -> Self {
        let parts = Parts::new(fixtures, overpass, builder);
        let session = ExplorerSession::new(parts.collaborators(), ExplorerConfig::default());
        parts.into_harness(session)
    }

    pub async fn with_url_param(
        fixtures: ScriptedResource,
        overpass: ScriptedResource,
        builder: FakeBuilder,
        scenario: &str,
    ) -> Self {
        let parts = Parts::new(fixtures, overpass, builder);
        parts.host.set_url_param(scenario);
        let session = ExplorerSession::create(parts.collaborators(), ExplorerConfig::default()).await;
        parts.into_harness(session)
    }
}

struct Parts {
    map: Rc<HeadlessMap>,
    host: Rc<RecordingHost>,
    builder: Rc<FakeBuilder>,
    fixtures: Rc<ScriptedResource>,
    overpass: Rc<ScriptedResource>,
}

impl Parts {
    fn new(fixtures: ScriptedResource, overpass: ScriptedResource, builder: FakeBuilder) -> Self {
        Self {
            map: Rc::new(HeadlessMap::new(
                GeoBounds::new(47.59, -122.32, 47.62, -122.29),
                16.0,
            )),
            host: Rc::new(RecordingHost::default()),
            builder: Rc::new(builder),
            fixtures: Rc::new(fixtures),
            overpass: Rc::new(overpass),
        }
    }

    fn collaborators(&self) -> Collaborators {
        Collaborators {
            map: self.map.clone(),
            view: self.map.clone(),
            fixtures: self.fixtures.clone(),
            overpass: self.overpass.clone(),
            builder: self.builder.clone(),
            settings: self.host.clone(),
            trigger: self.host.clone(),
            controls: self.host.clone(),
            notifier: self.host.clone(),
            downloader: self.host.clone(),
            url: self.host.clone(),
        }
    }

    fn into_harness(self, session: ExplorerSession) -> Harness {
        Harness {
            session,
            map: self.map,
            host: self.host,
            builder: self.builder,
        }
    }
}
