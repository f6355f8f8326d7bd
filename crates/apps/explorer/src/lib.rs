//! Street Explorer: scenario switching, the import workflow and the layer
//! groups built from a street-network engine's exports.

pub mod build;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod import;
pub mod scenario;
pub mod session;
pub mod settings;

#[cfg(test)]
mod testing;

pub use build::{BuiltLayers, build_network_layers};
pub use config::ExplorerConfig;
pub use engine::{DebugStep, EngineError, Network, NetworkBuilder};
pub use error::ExplorerError;
pub use host::*;
pub use import::{ImportGuard, ImportState, ImportWorkflow};
pub use scenario::{Scenario, ScenarioLoader};
pub use session::{ExplorerSession, ImportOutcome};
pub use settings::{ImportSettings, SettingsError, SettingsSource};
