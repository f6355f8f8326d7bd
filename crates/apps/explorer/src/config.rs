use std::env;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use streaming::{DEFAULT_OVERPASS_ENDPOINT, FixtureDir, HttpResource, OverpassResource, RemoteResource};
use tracing::warn;

/// Imports below this zoom level cover too much area to be useful.
pub const DEFAULT_MIN_IMPORT_ZOOM: f64 = 15.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Overpass interpreter used by "import current view".
    pub overpass_endpoint: String,
    /// Directory (or `http(s)://` base URL) holding `<scenario>/input.osm` fixtures.
    pub fixtures_root: String,
    pub min_import_zoom: f64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            overpass_endpoint: DEFAULT_OVERPASS_ENDPOINT.to_string(),
            fixtures_root: "tests".to_string(),
            min_import_zoom: DEFAULT_MIN_IMPORT_ZOOM,
        }
    }
}

impl ExplorerConfig {
    /// Defaults overridden by `OVERPASS_URL`, `TESTS_ROOT` and `MIN_IMPORT_ZOOM`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = env::var("OVERPASS_URL") {
            cfg.overpass_endpoint = url;
        }
        if let Ok(root) = env::var("TESTS_ROOT") {
            cfg.fixtures_root = root;
        }
        if let Ok(zoom) = env::var("MIN_IMPORT_ZOOM") {
            match zoom.parse::<f64>() {
                Ok(z) => cfg.min_import_zoom = z,
                Err(err) => warn!("ignoring MIN_IMPORT_ZOOM={zoom}: {err}"),
            }
        }
        cfg
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn fixture_resource(&self) -> Rc<dyn RemoteResource> {
        let root = self.fixtures_root.as_str();
        if root.starts_with("http://") || root.starts_with("https://") {
            Rc::new(HttpResource::new(root))
        } else {
            Rc::new(FixtureDir::new(root))
        }
    }

    pub fn overpass_resource(&self) -> Rc<dyn RemoteResource> {
        Rc::new(OverpassResource::new(self.overpass_endpoint.clone()))
    }
}
