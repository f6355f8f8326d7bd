use std::fmt;
use std::rc::Rc;

use foundation::GeoBounds;
use layers::{Layer, LayerGroup};
use streaming::INPUT_FILE;
use tracing::debug;

use crate::build::{GEOMETRY_LAYER, NETWORK_LAYER, OSM_LAYER, build_network_layers};
use crate::error::ExplorerError;
use crate::host::ScenarioControl;
use crate::import::{IMPORTED_GROUP, ImportGuard};
use crate::session::ExplorerSession;
use crate::settings::ImportSettings;

pub const FIXTURE_GROUP: &str = "built-in test case";
pub const GEOMETRY_FILE: &str = "geometry.json";
pub const NETWORK_FILE: &str = "road_network.dot";

/// Selector value for scenarios that are not built-in test cases.
pub const DYNAMIC_SCENARIO: &str = "dynamic";

/// The map area currently being inspected.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    name: Option<String>,
    raw_input: Rc<str>,
    bounds: GeoBounds,
}

impl Scenario {
    pub fn fixture(name: impl Into<String>, raw_input: Rc<str>, bounds: GeoBounds) -> Self {
        Self {
            name: Some(name.into()),
            raw_input,
            bounds,
        }
    }

    pub fn imported(raw_input: Rc<str>, bounds: GeoBounds) -> Self {
        Self {
            name: None,
            raw_input,
            bounds,
        }
    }

    /// Fixture name; `None` for imported areas.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn raw_input(&self) -> &Rc<str> {
        &self.raw_input
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    pub fn is_fixture(&self) -> bool {
        self.name.is_some()
    }

    pub fn selector_value(&self) -> &str {
        self.name().unwrap_or(DYNAMIC_SCENARIO)
    }

    pub fn download_file_name(&self) -> String {
        format!("{}.osm.xml", self.name().unwrap_or("new"))
    }

    pub fn controls(&self) -> Vec<ScenarioControl> {
        let mut out = Vec::with_capacity(3);
        if self.is_fixture() {
            out.push(ScenarioControl::GenerateDetails);
        }
        out.push(ScenarioControl::DownloadInput {
            file_name: self.download_file_name(),
        });
        out.push(ScenarioControl::ResetView);
        out
    }
}

/// How the next scenario is produced.
pub enum ScenarioLoader {
    /// A built-in test case read from the fixtures resource.
    Fixture { name: String },
    /// The current map view, fetched from Overpass and run through the engine.
    ImportedView {
        guard: ImportGuard,
        bounds: GeoBounds,
        settings: ImportSettings,
    },
}

impl fmt::Display for ScenarioLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioLoader::Fixture { name } => write!(f, "test case {name}"),
            ScenarioLoader::ImportedView { bounds, .. } => write!(f, "imported view {bounds}"),
        }
    }
}

impl ScenarioLoader {
    pub fn fixture(name: impl Into<String>) -> Self {
        ScenarioLoader::Fixture { name: name.into() }
    }

    /// Produces the scenario and installs its groups on `session`.
    ///
    /// `Ok(None)` means a newer switch started while this one was suspended;
    /// nothing was installed.
    pub(crate) async fn load(
        self,
        session: &ExplorerSession,
        generation: u64,
    ) -> Result<Option<Scenario>, ExplorerError> {
        match self {
            ScenarioLoader::Fixture { name } => load_fixture(session, name, generation).await,
            ScenarioLoader::ImportedView {
                guard,
                bounds,
                settings,
            } => load_imported_view(session, guard, bounds, settings, generation).await,
        }
    }
}

async fn load_fixture(
    session: &ExplorerSession,
    name: String,
    generation: u64,
) -> Result<Option<Scenario>, ExplorerError> {
    let raw: Rc<str> = session.fetch_fixture(&format!("{name}/{INPUT_FILE}")).await?.into();
    let geometry = session.fetch_fixture(&format!("{name}/{GEOMETRY_FILE}")).await?;
    let network = session.fetch_fixture(&format!("{name}/{NETWORK_FILE}")).await?;
    if !session.is_current(generation) {
        debug!("discarding stale test case {name}");
        return Ok(None);
    }

    let geometry = Layer::geometry(geometry);
    let bounds = geometry
        .bounds()
        .ok_or_else(|| ExplorerError::EmptyGeometry {
            scenario: name.clone(),
        })?;

    let mut group = LayerGroup::new(FIXTURE_GROUP, session.map());
    group.add_layer(OSM_LAYER, Layer::osm(raw.clone()), false)?;
    group.add_layer(NETWORK_LAYER, Layer::network(network), true)?;
    group.add_layer(GEOMETRY_LAYER, geometry, true)?;

    if !session.install(generation, vec![group.into()])? {
        return Ok(None);
    }
    Ok(Some(Scenario::fixture(name, raw, bounds)))
}

async fn load_imported_view(
    session: &ExplorerSession,
    mut guard: ImportGuard,
    bounds: GeoBounds,
    settings: ImportSettings,
    generation: u64,
) -> Result<Option<Scenario>, ExplorerError> {
    let raw = session.import_workflow().fetch(&guard, &bounds).await?;
    if !session.is_current(generation) {
        debug!("discarding stale import of {bounds}");
        return Ok(None);
    }

    guard.building();
    let raw: Rc<str> = raw.into();
    let built = build_network_layers(
        IMPORTED_GROUP,
        &raw,
        &settings,
        session.builder(),
        &session.map(),
        true,
    )?;
    let area = built.bounds.unwrap_or(bounds);
    let (groups, failures) = built.into_groups();
    if !session.install(generation, groups)? {
        return Ok(None);
    }
    session.report_failures(&failures);
    session.clear_scenario_param();
    Ok(Some(Scenario::imported(raw, area)))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use foundation::GeoBounds;
    use pretty_assertions::assert_eq;

    use super::Scenario;
    use crate::host::ScenarioControl;

    #[test]
    fn fixtures_offer_details_and_keep_their_name() {
        let s = Scenario::fixture("aurora_sidewalks", Rc::from("<osm/>"), GeoBounds::point(1.0, 2.0));
        assert_eq!(s.selector_value(), "aurora_sidewalks");
        assert_eq!(
            s.controls(),
            vec![
                ScenarioControl::GenerateDetails,
                ScenarioControl::DownloadInput {
                    file_name: "aurora_sidewalks.osm.xml".to_string()
                },
                ScenarioControl::ResetView,
            ]
        );
    }

    #[test]
    fn imported_areas_are_dynamic() {
        let s = Scenario::imported(Rc::from("<osm/>"), GeoBounds::point(1.0, 2.0));
        assert_eq!(s.name(), None);
        assert_eq!(s.selector_value(), "dynamic");
        assert_eq!(s.download_file_name(), "new.osm.xml");
        assert_eq!(s.controls().len(), 2);
        assert_eq!(s.controls()[0].label(), "Download osm.xml");
    }
}
