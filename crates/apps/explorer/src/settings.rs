use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options handed to the engine for one build.
///
/// Missing or unknown fields never fail: everything defaults to off.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportSettings {
    /// Record a `DebugStep` after each transformation.
    pub debug_each_step: bool,
    pub dual_carriageway_experiment: bool,
    pub cycletrack_snapping_experiment: bool,
    pub inferred_sidewalks: bool,
    pub osm2lanes: bool,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid import settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("import settings unavailable: {0}")]
    Unavailable(String),
}

impl ImportSettings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads submitted form fields. Checkboxes count as set when present with a
    /// non-empty value; the sidewalk selector enables inference with `infer`.
    pub fn from_form<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut out = Self::default();
        for (key, value) in pairs {
            let checked = !value.is_empty();
            match key {
                "debugEachStep" => out.debug_each_step = checked,
                "dualCarriagewayExperiment" => out.dual_carriageway_experiment = checked,
                "cycletrackSnappingExperiment" => out.cycletrack_snapping_experiment = checked,
                "sidewalks" => out.inferred_sidewalks = value == "infer",
                "inferredSidewalks" => out.inferred_sidewalks = checked,
                "osm2lanes" => out.osm2lanes = checked,
                _ => {}
            }
        }
        out
    }
}

/// Where the current import settings come from (usually a settings form).
pub trait SettingsSource {
    fn import_settings(&self) -> Result<ImportSettings, SettingsError>;
}

impl SettingsSource for ImportSettings {
    fn import_settings(&self) -> Result<ImportSettings, SettingsError> {
        Ok(*self)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::ImportSettings;

    #[test]
    fn json_fields_default_to_off() {
        let s = ImportSettings::from_json(r#"{"inferredSidewalks": true, "futureFlag": 3}"#)
            .expect("parse");
        assert_eq!(
            s,
            ImportSettings {
                inferred_sidewalks: true,
                ..ImportSettings::default()
            }
        );
        assert_eq!(
            ImportSettings::from_json("{}").expect("parse"),
            ImportSettings::default()
        );
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(ImportSettings::from_json(r#"{"osm2lanes": "yes"}"#).is_err());
    }

    #[test]
    fn form_pairs_map_to_flags() {
        let s = ImportSettings::from_form([
            ("debugEachStep", "on"),
            ("sidewalks", "infer"),
            ("osm2lanes", ""),
            ("unknown", "on"),
        ]);
        assert_eq!(
            s,
            ImportSettings {
                debug_each_step: true,
                inferred_sidewalks: true,
                ..ImportSettings::default()
            }
        );

        let s = ImportSettings::from_form([("sidewalks", "tagged")]);
        assert!(!s.inferred_sidewalks);
    }

    #[test]
    fn serializes_camel_case() {
        let s = ImportSettings {
            dual_carriageway_experiment: true,
            ..ImportSettings::default()
        };
        let v = serde_json::to_value(s).expect("json");
        assert_eq!(v["dualCarriagewayExperiment"], serde_json::Value::Bool(true));
        assert_eq!(v["osm2lanes"], serde_json::Value::Bool(false));
    }
}
