//! Contract of the street-network engine.
//!
//! The engine is an external collaborator: it turns raw OSM XML plus
//! `ImportSettings` into a `Network` whose exports are produced on demand.
//! Every export can fail on its own; callers decide whether a failure aborts
//! the build or only the layer that asked for it.

use std::rc::Rc;

use thiserror::Error;

use crate::settings::ImportSettings;

/// Failure reported by the engine, kept verbatim for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub trait NetworkBuilder {
    fn construct(
        &self,
        raw_input: &str,
        settings: &ImportSettings,
    ) -> Result<Rc<dyn Network>, EngineError>;
}

pub trait Network {
    fn to_geojson_plain(&self) -> Result<String, EngineError>;
    fn to_lane_polygons_geojson(&self) -> Result<String, EngineError>;
    fn to_lane_markings_geojson(&self) -> Result<String, EngineError>;
    fn to_intersection_markings_geojson(&self) -> Result<String, EngineError>;
    fn debug_clockwise_ordering_geojson(&self) -> Result<String, EngineError>;
    fn debug_movements_geojson(&self) -> Result<String, EngineError>;

    /// Snapshots recorded after each transformation, in the order they ran.
    /// Empty unless the network was built with `debug_each_step`.
    fn debug_steps(&self) -> Result<Vec<Rc<dyn DebugStep>>, EngineError>;
}

/// One labeled intermediate snapshot. Immutable once produced.
pub trait DebugStep {
    fn label(&self) -> String;
    fn network(&self) -> Rc<dyn Network>;
    fn to_debug_geojson(&self) -> Option<String>;
}
