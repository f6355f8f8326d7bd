use layers::LayerError;
use streaming::FetchError;
use thiserror::Error;

use crate::engine::EngineError;

/// Why a scenario switch or build failed. Each variant names the stage.
#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("fetching {what} failed: {source}")]
    Fetch {
        what: String,
        #[source]
        source: FetchError,
    },
    /// The engine rejected the input or the settings.
    #[error("{0}")]
    Construction(#[source] EngineError),
    #[error("exporting {layer} failed: {source}")]
    Export {
        layer: String,
        #[source]
        source: EngineError,
    },
    #[error(transparent)]
    Layers(#[from] LayerError),
    #[error("Zoom in more to import")]
    ZoomTooLow { zoom: f64, min: f64 },
    #[error("{scenario} has no geometry to frame")]
    EmptyGeometry { scenario: String },
    #[error("no built-in test case is loaded")]
    NotAFixture,
    #[error("no scenario is loaded")]
    NoScenario,
}

impl ExplorerError {
    pub fn stage(&self) -> &'static str {
        match self {
            ExplorerError::Fetch { .. } => "fetch",
            ExplorerError::Construction(_) => "construct",
            ExplorerError::Export { .. } => "export",
            ExplorerError::Layers(LayerError::Materialize(_)) => "materialize",
            ExplorerError::Layers(_) => "layers",
            ExplorerError::ZoomTooLow { .. } => "zoom",
            ExplorerError::EmptyGeometry { .. } => "bounds",
            ExplorerError::NotAFixture | ExplorerError::NoScenario => "controls",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExplorerError;
    use crate::engine::EngineError;
    use streaming::FetchError;

    #[test]
    fn construction_errors_are_verbatim() {
        let err = ExplorerError::Construction(EngineError::new("no roads in input"));
        assert_eq!(err.to_string(), "no roads in input");
        assert_eq!(err.stage(), "construct");
    }

    #[test]
    fn fetch_errors_name_the_resource() {
        let err = ExplorerError::Fetch {
            what: "overpass data".to_string(),
            source: FetchError::Status {
                url: "https://overpass.example".to_string(),
                status: 504,
            },
        };
        assert_eq!(
            err.to_string(),
            "fetching overpass data failed: https://overpass.example returned HTTP 504"
        );
        assert_eq!(err.stage(), "fetch");
    }
}
